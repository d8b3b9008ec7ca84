use std::time::Duration;

/// Spatial radius (pixels) within which a detection matches an existing
/// capture session or a cooldown entry.
pub const MATCH_RADIUS: f64 = 80.0;

/// Samples accumulated before a capture session completes.
pub const SAMPLES_PER_SESSION: usize = 5;

/// Only every Nth matched detection actually extracts a sample, so the
/// stored crops show some pose variety.
pub const SAMPLE_INTERVAL: usize = 3;

/// Minimum samples a session must hold for finalize to succeed.
pub const MIN_VIABLE_SAMPLES: usize = 1;

/// A session with no matching detection for this long is cancelled.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(3);

/// After a session completes, no new session may start near its anchor
/// until this cooldown elapses.
pub const CAPTURE_COOLDOWN: Duration = Duration::from_secs(60);

/// Business-level cooldown before the same identity can be recorded again.
pub const ATTENDANCE_COOLDOWN: Duration = Duration::from_secs(3600);

/// In-process burst window: repeat events for one identity inside this
/// window never reach the durable log.
pub const BURST_WINDOW: Duration = Duration::from_secs(5);

/// Crops smaller than this on either side are upscaled before storage
/// (the downstream embedding model needs 112x112 input).
pub const MIN_SAMPLE_DIM: u32 = 112;

/// Fractional margin added around a detection box when cropping a sample.
pub const SAMPLE_MARGIN: f64 = 0.20;

pub const DEFAULT_FRAME_SKIP: usize = 2;
pub const MIN_FRAME_SKIP: usize = 1;
pub const MAX_FRAME_SKIP: usize = 5;

/// Capacity of the frame and result buffers. Small on purpose: a full
/// buffer drops the newest item, keeping end-to-end latency low.
pub const QUEUE_CAPACITY: usize = 2;

/// Timed-wait bound for every blocking queue poll, so workers can observe
/// the stop flag and shutdown never hangs.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);
