use std::path::PathBuf;

use crate::shared::frame::Frame;

/// Persistence seam for completed capture sessions.
///
/// Receives the ordered sample crops of one session and returns where the
/// bundle was written.
pub trait SampleStore: Send {
    fn store(
        &mut self,
        session_id: &str,
        samples: &[Frame],
    ) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
