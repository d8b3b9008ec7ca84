use std::time::Duration;

use crate::pipeline::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

/// Device-free frame source: emits flat RGB frames at a fixed pace.
///
/// Stands in for a camera during soak runs and tests, so the pipeline can
/// be exercised end to end without capture hardware.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    frame_interval: Duration,
    remaining: Option<usize>,
    index: usize,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32, frame_interval: Duration) -> Self {
        Self {
            width,
            height,
            frame_interval,
            remaining: None,
            index: 0,
        }
    }

    /// Ends the stream after `frames` frames instead of running forever.
    pub fn with_limit(mut self, frames: usize) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(n) => *n -= 1,
            None => {}
        }

        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }

        let fill = (self.index % 256) as u8;
        let data = vec![fill; (self.width * self.height * 3) as usize];
        let frame = Frame::new(data, self.width, self.height, 3, self.index);
        self.index += 1;
        Ok(Some(frame))
    }
}
