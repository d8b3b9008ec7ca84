use chrono::{DateTime, Local};

/// Secondary sync target for accepted attendance events (e.g. a hosted
/// relational database behind the kiosk).
///
/// Strictly best-effort: a failing push must never block or invalidate the
/// primary durable write.
pub trait RemoteAttendanceSink: Send {
    fn push(
        &mut self,
        name: &str,
        recorded_at: DateTime<Local>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
