use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, TrySendError};
use thiserror::Error;

use crate::attendance::debouncer::{AttendanceDebouncer, DebounceConfig};
use crate::attendance::domain::attendance_log::AttendanceLog;
use crate::perception::domain::detection::Detection;
use crate::perception::infrastructure::decimated_perception::DecimatedPerception;
use crate::pipeline::controls::PipelineControls;
use crate::pipeline::domain::frame_source::FrameSource;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::{POLL_TIMEOUT, QUEUE_CAPACITY};
use crate::shared::frame::Frame;
use crate::tracking::spatial_tracker::{SpatialTracker, TrackOutcome};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

/// What an overlay renderer should draw for one detection this cycle.
/// Rendering itself stays outside the core.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayState {
    Recognized { name: String, confidence: f64 },
    Capturing { progress: String },
    /// The capture finished on this cycle; renderers flash a completion
    /// notice before the anchor settles into `AlreadyCaptured`.
    Captured,
    AlreadyCaptured,
}

#[derive(Clone, Debug)]
pub struct OverlayEvent {
    pub bbox: BoundingBox,
    pub state: OverlayState,
}

pub type OverlayCallback = Box<dyn Fn(&OverlayEvent) + Send>;

/// Per-run configuration for the orchestrator.
pub struct PipelineConfig {
    pub controls: PipelineControls,
    pub poll_timeout: Duration,
    pub on_overlay: Option<OverlayCallback>,
    pub logger: Box<dyn PipelineLogger>,
    pub debounce: DebounceConfig,
}

impl PipelineConfig {
    pub fn new(controls: PipelineControls, logger: Box<dyn PipelineLogger>) -> Self {
        Self {
            controls,
            poll_timeout: POLL_TIMEOUT,
            on_overlay: None,
            logger,
            debounce: DebounceConfig::default(),
        }
    }
}

/// Runs the attendance pipeline with dedicated threads per stage.
///
/// Layout: `source → perception → main [track/dispatch]`, with the
/// attendance debouncer consuming identity events on its own worker.
///
/// Frames flow through small bounded buffers; a full buffer drops the
/// newest item so stale frames are never queued behind fresh ones. Every
/// blocking wait is timed, so the stop flag is observed everywhere and
/// shutdown cannot hang.
pub struct ThreadedAttendancePipeline {
    channel_capacity: usize,
}

impl ThreadedAttendancePipeline {
    pub fn new() -> Self {
        Self {
            channel_capacity: QUEUE_CAPACITY,
        }
    }

    pub fn run(
        &self,
        source: Box<dyn FrameSource>,
        perception: DecimatedPerception,
        tracker: Arc<SpatialTracker>,
        attendance_log: Box<dyn AttendanceLog>,
        mut config: PipelineConfig,
    ) -> Result<(), PipelineError> {
        let stop = config.controls.stop_handle();

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(self.channel_capacity);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<(Frame, Vec<Detection>)>(self.channel_capacity);

        let source_handle = spawn_frame_source(source, frame_tx, stop.clone());
        let perception_handle = spawn_perception(
            perception,
            frame_rx,
            result_tx,
            stop.clone(),
            config.poll_timeout,
        );
        let debouncer =
            AttendanceDebouncer::spawn(attendance_log, stop.clone(), config.debounce.clone());

        run_main_loop(&result_rx, &tracker, &debouncer, &stop, &mut config);

        // Main loop is done; make sure the workers wind down too.
        stop.store(true, Ordering::Relaxed);
        drop(result_rx);

        let mut first_error = None;
        if source_handle.join().is_err() {
            first_error.get_or_insert(PipelineError::WorkerPanicked("frame source"));
        }
        if perception_handle.join().is_err() {
            first_error.get_or_insert(PipelineError::WorkerPanicked("perception"));
        }
        debouncer.shutdown();

        config.logger.summary();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for ThreadedAttendancePipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_frame_source(
    mut source: Box<dyn FrameSource>,
    frame_tx: crossbeam_channel::Sender<Frame>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut dropped: u64 = 0;
        while !stop.load(Ordering::Relaxed) {
            match source.next_frame() {
                Ok(Some(frame)) => match frame_tx.try_send(frame) {
                    Ok(()) => {}
                    // Buffer full: drop the newest frame rather than queue
                    // it behind the ones already waiting.
                    Err(TrySendError::Full(_)) => dropped += 1,
                    Err(TrySendError::Disconnected(_)) => break,
                },
                Ok(None) => break,
                // Transient device hiccup; retry forever.
                Err(e) => log::debug!("frame read failed, retrying: {e}"),
            }
        }
        if dropped > 0 {
            log::debug!("frame source dropped {dropped} frames on a full buffer");
        }
    })
}

fn spawn_perception(
    mut perception: DecimatedPerception,
    frame_rx: crossbeam_channel::Receiver<Frame>,
    result_tx: crossbeam_channel::Sender<(Frame, Vec<Detection>)>,
    stop: Arc<AtomicBool>,
    poll_timeout: Duration,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match frame_rx.recv_timeout(poll_timeout) {
            Ok(frame) => match perception.process(&frame) {
                Ok(detections) => {
                    // Same freshness policy as the frame buffer.
                    let _ = result_tx.try_send((frame, detections));
                }
                Err(e) => log::warn!("perception failed on frame {}: {e}", frame.index()),
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    })
}

fn run_main_loop(
    result_rx: &crossbeam_channel::Receiver<(Frame, Vec<Detection>)>,
    tracker: &SpatialTracker,
    debouncer: &AttendanceDebouncer,
    stop: &AtomicBool,
    config: &mut PipelineConfig,
) {
    let mut frames: usize = 0;
    let mut window_start = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let (frame, detections) = match result_rx.recv_timeout(config.poll_timeout) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let now = Instant::now();
        for detection in &detections {
            let state = match &detection.identity {
                Some(name) => {
                    debouncer.submit(name, detection.confidence);
                    OverlayState::Recognized {
                        name: name.clone(),
                        confidence: detection.confidence,
                    }
                }
                None => {
                    let outcome = tracker.observe(&frame, &detection.bbox, now);
                    match outcome {
                        TrackOutcome::Cooldown => OverlayState::AlreadyCaptured,
                        TrackOutcome::Sampling { .. } => OverlayState::Capturing {
                            progress: outcome.progress_label().unwrap_or_default(),
                        },
                        TrackOutcome::Completed { .. } => OverlayState::Captured,
                    }
                }
            };
            if let Some(callback) = config.on_overlay.as_ref() {
                callback(&OverlayEvent {
                    bbox: detection.bbox,
                    state,
                });
            }
        }

        tracker.sweep_expired(now);

        frames += 1;
        config
            .logger
            .metric("latency_ms", frame.captured_at().elapsed().as_secs_f64() * 1000.0);
        if frames % 30 == 0 {
            let fps = 30.0 / window_start.elapsed().as_secs_f64();
            config.logger.metric("fps", fps);
            window_start = Instant::now();
        }
    }
}
