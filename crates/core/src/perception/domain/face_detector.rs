use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may be stateful (model sessions, warm caches),
/// hence `&mut self`. An empty result is normal, not an error.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
