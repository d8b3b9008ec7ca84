use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::perception::domain::detection::Detection;
use crate::perception::domain::face_detector::FaceDetector;
use crate::perception::domain::face_recognizer::FaceRecognizer;
use crate::shared::frame::Frame;

/// Perception stage with frame-skip decimation.
///
/// Runs detection + recognition on every `k`-th frame and returns the last
/// computed list verbatim in between, so downstream consumers always see a
/// recent-enough view without paying model cost per frame. `k` is shared
/// with the control surface and may change between calls.
pub struct DecimatedPerception {
    detector: Box<dyn FaceDetector>,
    recognizer: Box<dyn FaceRecognizer>,
    frame_skip: Arc<AtomicUsize>,
    frame_counter: usize,
    last_detections: Vec<Detection>,
}

impl DecimatedPerception {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        recognizer: Box<dyn FaceRecognizer>,
        frame_skip: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            detector,
            recognizer,
            frame_skip,
            frame_counter: 0,
            last_detections: Vec::new(),
        }
    }

    /// Produces the detection list for `frame`.
    ///
    /// Skipped frames reuse the previous real result; they never see a
    /// future one. Model errors propagate so the caller can log and keep
    /// its loop alive.
    pub fn process(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let skip = self.frame_skip.load(Ordering::Relaxed).max(1);
        self.frame_counter += 1;
        if self.frame_counter % skip != 0 {
            return Ok(self.last_detections.clone());
        }

        let boxes = self.detector.detect(frame)?;
        let mut detections = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let matched = self.recognizer.recognize(frame, &bbox)?;
            detections.push(match matched.identity {
                Some(name) => Detection::recognized(bbox, name, matched.similarity),
                None => Detection::unknown(bbox),
            });
        }

        self.last_detections = detections.clone();
        Ok(detections)
    }
}
