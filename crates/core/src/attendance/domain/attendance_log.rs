/// Aggregate view of one day's attendance records.
#[derive(Clone, Debug, PartialEq)]
pub struct AttendanceSummary {
    /// Date in `YYYY-MM-DD`.
    pub date: String,
    /// Rows recorded for the date (an identity can appear more than once
    /// across cooldown windows).
    pub total_records: usize,
    pub unique_attendees: usize,
    pub names: Vec<String>,
}

/// Durable, append-only attendance record log.
///
/// `commit` applies the business-level per-identity cooldown internally:
/// `Ok(false)` means the event was suppressed by that cooldown, which is
/// normal operation, not an error.
pub trait AttendanceLog: Send {
    fn commit(&mut self, name: &str, confidence: f64) -> Result<bool, Box<dyn std::error::Error>>;

    fn today_summary(&self) -> Result<AttendanceSummary, Box<dyn std::error::Error>>;
}
