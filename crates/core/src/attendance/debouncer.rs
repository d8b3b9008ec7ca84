use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::attendance::burst_filter::BurstFilter;
use crate::attendance::domain::attendance_log::AttendanceLog;
use crate::shared::constants::{BURST_WINDOW, POLL_TIMEOUT};

/// Tunables for the debounce worker.
#[derive(Clone, Debug)]
pub struct DebounceConfig {
    pub burst_window: Duration,
    pub poll_timeout: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            burst_window: BURST_WINDOW,
            poll_timeout: POLL_TIMEOUT,
        }
    }
}

struct AttendanceEvent {
    name: String,
    confidence: f64,
}

/// Background worker that consumes recognized-identity events and commits
/// them to the durable log without ever blocking the visual loop.
///
/// Submission is non-blocking; the worker applies the in-process burst
/// filter, then delegates to the log, which enforces the longer business
/// cooldown itself. A timed-out wait is expected control flow (loop again
/// and re-check the stop flag); commit failures are logged and the worker
/// keeps consuming.
pub struct AttendanceDebouncer {
    tx: Sender<AttendanceEvent>,
    handle: JoinHandle<()>,
}

impl AttendanceDebouncer {
    pub fn spawn(
        mut log: Box<dyn AttendanceLog>,
        stop: Arc<AtomicBool>,
        config: DebounceConfig,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<AttendanceEvent>();

        let handle = std::thread::spawn(move || {
            let mut filter = BurstFilter::new(config.burst_window);
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                match rx.recv_timeout(config.poll_timeout) {
                    Ok(event) => {
                        let now = Instant::now();
                        if filter.accept(&event.name, now) {
                            match log.commit(&event.name, event.confidence) {
                                Ok(true) => {}
                                Ok(false) => {
                                    log::debug!("{} within attendance cooldown", event.name)
                                }
                                Err(e) => {
                                    log::error!("attendance commit failed for {}: {e}", event.name)
                                }
                            }
                        }
                        filter.prune(now);
                    }
                    // Empty queue; normal. Loop to re-check the stop flag.
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self { tx, handle }
    }

    /// Queues an identity event. Never blocks; the channel is unbounded and
    /// a closed channel (worker already stopped) is ignored.
    pub fn submit(&self, name: &str, confidence: f64) {
        let _ = self.tx.send(AttendanceEvent {
            name: name.to_string(),
            confidence,
        });
    }

    /// Closes the queue and waits for the worker to drain and exit.
    pub fn shutdown(self) {
        drop(self.tx);
        if self.handle.join().is_err() {
            log::error!("attendance worker panicked");
        }
    }
}
