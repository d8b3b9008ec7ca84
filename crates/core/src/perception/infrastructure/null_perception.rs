use crate::perception::domain::face_detector::FaceDetector;
use crate::perception::domain::face_recognizer::{FaceRecognizer, RecognizerMatch};
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Detector that never finds a face. Stands in for the real model during
/// soak runs where only pipeline mechanics are of interest.
pub struct NullFaceDetector;

impl FaceDetector for NullFaceDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Ok(Vec::new())
    }
}

/// Recognizer that matches nothing.
pub struct NullFaceRecognizer;

impl FaceRecognizer for NullFaceRecognizer {
    fn recognize(
        &mut self,
        _frame: &Frame,
        _bbox: &BoundingBox,
    ) -> Result<RecognizerMatch, Box<dyn std::error::Error>> {
        Ok(RecognizerMatch::unknown())
    }
}
