use std::time::Instant;

use image::imageops::FilterType;
use image::RgbImage;

use crate::shared::bbox::{Anchor, BoundingBox};
use crate::shared::constants::{MIN_SAMPLE_DIM, SAMPLE_MARGIN};
use crate::shared::frame::Frame;

/// An in-progress accumulation of sample crops for one unidentified face,
/// keyed by its anchor position on screen.
///
/// Sampling is gated by an interval counter so consecutive video frames do
/// not all land in the training set; spaced samples carry more pose variety.
#[derive(Debug)]
pub struct CaptureSession {
    id: String,
    anchor: Anchor,
    samples: Vec<Frame>,
    interval_counter: usize,
    sample_interval: usize,
    last_seen: Instant,
}

impl CaptureSession {
    pub fn new(id: String, anchor: Anchor, sample_interval: usize, now: Instant) -> Self {
        Self {
            id,
            anchor,
            samples: Vec::new(),
            interval_counter: 0,
            sample_interval: sample_interval.max(1),
            last_seen: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn into_samples(self) -> Vec<Frame> {
        self.samples
    }

    /// Routes one matched detection into the session. Refreshes the
    /// last-seen timestamp on every call but only extracts a crop on every
    /// `sample_interval`-th call. Returns whether a sample was taken.
    pub fn observe(&mut self, frame: &Frame, bbox: &BoundingBox, now: Instant) -> bool {
        self.last_seen = now;

        self.interval_counter += 1;
        if self.interval_counter < self.sample_interval {
            return false;
        }
        self.interval_counter = 0;

        let padded = bbox.expanded(SAMPLE_MARGIN, frame.width(), frame.height());
        let crop = frame.crop(&padded);
        if crop.width() == 0 || crop.height() == 0 {
            return false;
        }
        self.samples.push(upscale_to_minimum(crop));
        true
    }

    /// Overlay label while the session is filling up, e.g. `"3/5"`.
    pub fn progress(&self, target: usize) -> String {
        format!("{}/{}", self.samples.len(), target)
    }
}

/// The embedding model downstream needs at least 112px per side; smaller
/// crops are upscaled preserving aspect ratio (cubic interpolation).
fn upscale_to_minimum(crop: Frame) -> Frame {
    let (w, h) = (crop.width(), crop.height());
    if w >= MIN_SAMPLE_DIM && h >= MIN_SAMPLE_DIM {
        return crop;
    }
    if crop.channels() != 3 {
        return crop;
    }

    let scale = f64::max(
        MIN_SAMPLE_DIM as f64 / w as f64,
        MIN_SAMPLE_DIM as f64 / h as f64,
    );
    let new_w = (w as f64 * scale).round() as u32;
    let new_h = (h as f64 * scale).round() as u32;

    let index = crop.index();
    let image = match RgbImage::from_raw(w, h, crop.into_data()) {
        Some(img) => img,
        None => return Frame::new(vec![0; 0], 0, 0, 3, index),
    };
    let resized = image::imageops::resize(&image, new_w, new_h, FilterType::CatmullRom);
    Frame::new(resized.into_raw(), new_w, new_h, 3, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![128u8; (width * height * 3) as usize], width, height, 3, 0)
    }

    fn session(interval: usize) -> CaptureSession {
        CaptureSession::new(
            "unknown_0_20250101_090000".into(),
            Anchor::new(320.0, 240.0),
            interval,
            Instant::now(),
        )
    }

    #[test]
    fn test_samples_only_on_interval() {
        let f = frame(640, 480);
        let bbox = BoundingBox::new(100, 400, 400, 100);
        let mut s = session(3);

        let mut sampled = Vec::new();
        for _ in 0..9 {
            sampled.push(s.observe(&f, &bbox, Instant::now()));
        }

        assert_eq!(
            sampled,
            vec![false, false, true, false, false, true, false, false, true]
        );
        assert_eq!(s.sample_count(), 3);
    }

    #[test]
    fn test_interval_one_samples_every_call() {
        let f = frame(640, 480);
        let bbox = BoundingBox::new(100, 400, 400, 100);
        let mut s = session(1);

        for _ in 0..4 {
            assert!(s.observe(&f, &bbox, Instant::now()));
        }
        assert_eq!(s.sample_count(), 4);
    }

    #[test]
    fn test_observe_refreshes_last_seen_even_without_sample() {
        let f = frame(640, 480);
        let bbox = BoundingBox::new(100, 400, 400, 100);
        let mut s = session(3);

        let later = Instant::now() + std::time::Duration::from_secs(2);
        s.observe(&f, &bbox, later);
        assert_eq!(s.last_seen(), later);
        assert_eq!(s.sample_count(), 0);
    }

    #[test]
    fn test_offscreen_box_takes_no_sample() {
        let f = frame(640, 480);
        // Entirely past the right edge, reaching the bottom of the frame.
        let bbox = BoundingBox::new(100, 760, 479, 700);
        let mut s = session(1);

        assert!(!s.observe(&f, &bbox, Instant::now()));
        assert_eq!(s.sample_count(), 0);
    }

    #[test]
    fn test_small_crop_is_upscaled_to_minimum() {
        let f = frame(640, 480);
        // 50x40 face, below the 112px floor.
        let bbox = BoundingBox::new(100, 150, 140, 100);
        let mut s = session(1);

        assert!(s.observe(&f, &bbox, Instant::now()));
        let sample = &s.into_samples()[0];
        assert!(sample.width() >= MIN_SAMPLE_DIM);
        assert!(sample.height() >= MIN_SAMPLE_DIM);
    }

    #[test]
    fn test_upscale_preserves_aspect_ratio() {
        // 60x30 crop: scale driven by the short side, width follows.
        let small = Frame::new(vec![0u8; 60 * 30 * 3], 60, 30, 3, 0);
        let up = upscale_to_minimum(small);
        assert_eq!(up.height(), MIN_SAMPLE_DIM);
        assert_eq!(up.width(), 224);
    }

    #[test]
    fn test_large_crop_not_resized() {
        let f = frame(640, 480);
        let bbox = BoundingBox::new(100, 400, 400, 100);
        let mut s = session(1);

        s.observe(&f, &bbox, Instant::now());
        let sample = &s.into_samples()[0];
        // 300x300 box with 20% margin on each side.
        assert_eq!(sample.width(), 420);
        assert_eq!(sample.height(), 420);
    }

    #[test]
    fn test_progress_label() {
        let f = frame(640, 480);
        let bbox = BoundingBox::new(100, 400, 400, 100);
        let mut s = session(1);

        s.observe(&f, &bbox, Instant::now());
        s.observe(&f, &bbox, Instant::now());
        assert_eq!(s.progress(5), "2/5");
    }
}
