use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Result of matching one face crop against the enrolled gallery.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerMatch {
    /// `None` when no enrolled identity clears the similarity threshold.
    pub identity: Option<String>,
    /// Cosine similarity in [0, 1] against the best gallery entry.
    pub similarity: f64,
}

impl RecognizerMatch {
    pub fn unknown() -> Self {
        Self {
            identity: None,
            similarity: 0.0,
        }
    }
}

/// Domain interface for face recognition.
///
/// The implementation is expected to re-detect on an expanded crop around
/// `bbox` before embedding, so callers pass the full frame rather than a
/// pre-cropped face.
pub trait FaceRecognizer: Send {
    fn recognize(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<RecognizerMatch, Box<dyn std::error::Error>>;
}
