use crate::shared::frame::Frame;

/// Domain interface for frame acquisition.
///
/// `Ok(None)` means the source is exhausted (file playback, tests); a live
/// camera never returns it. `Err` is a transient device failure: the
/// caller retries and must never treat a single failed read as fatal.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
