use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::shared::constants::{MAX_FRAME_SKIP, MIN_FRAME_SKIP};

/// Cloneable runtime control surface for a running pipeline.
///
/// The decimation factor is the only tunable crossing the core/CLI
/// boundary while the pipeline runs; everything else is fixed at startup.
#[derive(Clone)]
pub struct PipelineControls {
    frame_skip: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl PipelineControls {
    pub fn new(initial_skip: usize) -> Self {
        Self {
            frame_skip: Arc::new(AtomicUsize::new(
                initial_skip.clamp(MIN_FRAME_SKIP, MAX_FRAME_SKIP),
            )),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn frame_skip(&self) -> usize {
        self.frame_skip.load(Ordering::Relaxed)
    }

    /// Skip more frames: faster, less accurate. Returns the new factor.
    pub fn increase_skip(&self) -> usize {
        let new = (self.frame_skip() + 1).min(MAX_FRAME_SKIP);
        self.frame_skip.store(new, Ordering::Relaxed);
        new
    }

    /// Skip fewer frames: slower, more accurate. Returns the new factor.
    pub fn decrease_skip(&self) -> usize {
        let new = self.frame_skip().saturating_sub(1).max(MIN_FRAME_SKIP);
        self.frame_skip.store(new, Ordering::Relaxed);
        new
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Shared handle the perception stage reads its factor from.
    pub fn frame_skip_handle(&self) -> Arc<AtomicUsize> {
        self.frame_skip.clone()
    }

    /// Shared stop flag every worker observes at its poll boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}
