use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::shared::bbox::{Anchor, BoundingBox};
use crate::shared::constants::{
    CAPTURE_COOLDOWN, MATCH_RADIUS, MIN_VIABLE_SAMPLES, SAMPLES_PER_SESSION, SAMPLE_INTERVAL,
    SESSION_TIMEOUT,
};
use crate::shared::frame::Frame;
use crate::tracking::capture_session::CaptureSession;
use crate::tracking::domain::sample_store::SampleStore;

/// Tunables for session matching and lifecycle.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Radius (px) for matching detections to sessions and cooldown entries.
    pub match_radius: f64,
    /// Samples that complete a session.
    pub samples_per_session: usize,
    /// Every Nth matched detection extracts a sample.
    pub sample_interval: usize,
    /// Fewer samples than this at finalize is a failed capture.
    pub min_viable_samples: usize,
    /// Idle time after which a session is cancelled.
    pub session_timeout: Duration,
    /// Suppression window around a just-completed session's anchor.
    pub capture_cooldown: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_radius: MATCH_RADIUS,
            samples_per_session: SAMPLES_PER_SESSION,
            sample_interval: SAMPLE_INTERVAL,
            min_viable_samples: MIN_VIABLE_SAMPLES,
            session_timeout: SESSION_TIMEOUT,
            capture_cooldown: CAPTURE_COOLDOWN,
        }
    }
}

/// Result of routing one unidentified detection through the tracker.
#[derive(Debug, PartialEq)]
pub enum TrackOutcome {
    /// A recently-completed capture sits within the match radius; the
    /// detection was ignored entirely.
    Cooldown,
    /// The detection fed an active session that is still filling up.
    Sampling { captured: usize, target: usize },
    /// The session reached its sample target and was finalized.
    /// `stored` is `None` when persistence failed or the session held
    /// fewer than the minimum viable samples; the cooldown applies anyway.
    Completed {
        session_id: String,
        stored: Option<PathBuf>,
    },
}

impl TrackOutcome {
    /// Overlay label for an in-progress capture, e.g. `"3/5"`.
    pub fn progress_label(&self) -> Option<String> {
        match self {
            TrackOutcome::Sampling { captured, target } => Some(format!("{captured}/{target}")),
            _ => None,
        }
    }
}

struct CooldownEntry {
    anchor: Anchor,
    expires_at: Instant,
}

struct TrackerInner {
    sessions: Vec<CaptureSession>,
    blacklist: Vec<CooldownEntry>,
    store: Box<dyn SampleStore>,
    next_seq: u64,
}

/// Clusters unidentified detections into multi-sample capture sessions by
/// screen proximity, and suppresses re-capture near just-completed ones.
///
/// All session and blacklist state lives behind one internal mutex;
/// `observe` and `sweep_expired` are the only entry points, each atomic.
/// Callers never touch raw session storage.
pub struct SpatialTracker {
    inner: Mutex<TrackerInner>,
    config: TrackerConfig,
}

impl SpatialTracker {
    pub fn new(store: Box<dyn SampleStore>, config: TrackerConfig) -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                sessions: Vec::new(),
                blacklist: Vec::new(),
                store,
                next_seq: 0,
            }),
            config,
        }
    }

    /// Match-or-create: routes one unidentified detection to the nearest
    /// active session within the match radius, creating a session when none
    /// qualifies, then runs the sample-extraction step and finalizes the
    /// session if it just reached its target.
    pub fn observe(&self, frame: &Frame, bbox: &BoundingBox, now: Instant) -> TrackOutcome {
        let center = bbox.center();
        let inner = &mut *self.inner.lock().expect("tracker mutex poisoned");

        // Cooldown blacklist first; expired entries are dropped as part of
        // the same scan.
        inner.blacklist.retain(|e| now < e.expires_at);
        if inner
            .blacklist
            .iter()
            .any(|e| e.anchor.distance_to(&center) < self.config.match_radius)
        {
            return TrackOutcome::Cooldown;
        }

        // Nearest active session under the radius. Ties resolve to the
        // first minimal-distance session in insertion order.
        let mut matched: Option<usize> = None;
        let mut min_distance = self.config.match_radius;
        for (i, session) in inner.sessions.iter().enumerate() {
            let distance = session.anchor().distance_to(&center);
            if distance < min_distance {
                min_distance = distance;
                matched = Some(i);
            }
        }

        let idx = match matched {
            Some(idx) => idx,
            None => {
                let id = format!(
                    "unknown_{}_{}",
                    inner.next_seq,
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                );
                inner.next_seq += 1;
                log::debug!("new capture session {id} at ({:.0}, {:.0})", center.x, center.y);
                inner.sessions.push(CaptureSession::new(
                    id,
                    center,
                    self.config.sample_interval,
                    now,
                ));
                inner.sessions.len() - 1
            }
        };

        inner.sessions[idx].observe(frame, bbox, now);

        if inner.sessions[idx].sample_count() >= self.config.samples_per_session {
            // `remove` keeps insertion order so the documented tie-break
            // stays stable across completions.
            let session = inner.sessions.remove(idx);
            let anchor = session.anchor();
            let outcome = self.finalize(inner, session);
            inner.blacklist.push(CooldownEntry {
                anchor,
                expires_at: now + self.config.capture_cooldown,
            });
            outcome
        } else {
            TrackOutcome::Sampling {
                captured: inner.sessions[idx].sample_count(),
                target: self.config.samples_per_session,
            }
        }
    }

    /// Attempted at most once per session. Storage failure is non-fatal:
    /// the session is gone either way and the caller gets `stored: None`.
    fn finalize(&self, inner: &mut TrackerInner, session: CaptureSession) -> TrackOutcome {
        let session_id = session.id().to_string();
        let samples = session.into_samples();

        if samples.len() < self.config.min_viable_samples {
            log::warn!(
                "capture {session_id} finalized with {} samples, need {}; discarding",
                samples.len(),
                self.config.min_viable_samples
            );
            return TrackOutcome::Completed {
                session_id,
                stored: None,
            };
        }

        match inner.store.store(&session_id, &samples) {
            Ok(path) => {
                log::info!(
                    "capture {session_id} complete: {} samples stored at {}",
                    samples.len(),
                    path.display()
                );
                TrackOutcome::Completed {
                    session_id,
                    stored: Some(path),
                }
            }
            Err(e) => {
                log::warn!("failed to store samples for capture {session_id}: {e}");
                TrackOutcome::Completed {
                    session_id,
                    stored: None,
                }
            }
        }
    }

    /// Drops sessions with no matching detection since the timeout,
    /// discarding their partial samples. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let inner = &mut *self.inner.lock().expect("tracker mutex poisoned");
        let timeout = self.config.session_timeout;
        let before = inner.sessions.len();
        inner.sessions.retain(|s| {
            let stale = now.duration_since(s.last_seen()) > timeout;
            if stale {
                log::debug!(
                    "cancelling stale capture {} ({} partial samples discarded)",
                    s.id(),
                    s.sample_count()
                );
            }
            !stale
        });
        before - inner.sessions.len()
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.lock().expect("tracker mutex poisoned").sessions.len()
    }

    pub fn cooldown_entries(&self) -> usize {
        self.inner.lock().expect("tracker mutex poisoned").blacklist.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FakeStore {
        calls: Arc<Mutex<Vec<(String, usize)>>>,
        fail: Arc<AtomicBool>,
    }

    impl FakeStore {
        fn new() -> (Self, Arc<Mutex<Vec<(String, usize)>>>, Arc<AtomicBool>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let fail = Arc::new(AtomicBool::new(false));
            (
                Self {
                    calls: calls.clone(),
                    fail: fail.clone(),
                },
                calls,
                fail,
            )
        }
    }

    impl SampleStore for FakeStore {
        fn store(
            &mut self,
            session_id: &str,
            samples: &[Frame],
        ) -> Result<PathBuf, Box<dyn std::error::Error>> {
            self.calls
                .lock()
                .unwrap()
                .push((session_id.to_string(), samples.len()));
            if self.fail.load(Ordering::Relaxed) {
                return Err("disk full".into());
            }
            Ok(PathBuf::from(format!("/tmp/{session_id}")))
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![90u8; 640 * 480 * 3], 640, 480, 3, 0)
    }

    fn bbox_at(cx: i32, cy: i32) -> BoundingBox {
        BoundingBox::new(cy - 60, cx + 60, cy + 60, cx - 60)
    }

    fn config(interval: usize, target: usize) -> TrackerConfig {
        TrackerConfig {
            sample_interval: interval,
            samples_per_session: target,
            ..TrackerConfig::default()
        }
    }

    fn tracker(cfg: TrackerConfig) -> (SpatialTracker, Arc<Mutex<Vec<(String, usize)>>>, Arc<AtomicBool>) {
        let (store, calls, fail) = FakeStore::new();
        (SpatialTracker::new(Box::new(store), cfg), calls, fail)
    }

    #[test]
    fn test_nearby_detections_share_one_session() {
        let (tracker, _, _) = tracker(config(1, 100));
        let f = frame();
        let now = Instant::now();

        tracker.observe(&f, &bbox_at(300, 200), now);
        // 50px away: inside the 80px radius, must merge.
        tracker.observe(&f, &bbox_at(350, 200), now);

        assert_eq!(tracker.active_sessions(), 1);
    }

    #[test]
    fn test_distant_detections_get_separate_sessions() {
        let (tracker, _, _) = tracker(config(1, 100));
        let f = frame();
        let now = Instant::now();

        tracker.observe(&f, &bbox_at(100, 100), now);
        tracker.observe(&f, &bbox_at(400, 400), now);

        assert_eq!(tracker.active_sessions(), 2);
    }

    #[test]
    fn test_equidistant_tie_goes_to_first_session() {
        let (tracker, calls, _) = tracker(config(1, 2));
        let f = frame();
        let now = Instant::now();

        // Two sessions 120px apart, both active.
        tracker.observe(&f, &bbox_at(100, 100), now);
        tracker.observe(&f, &bbox_at(220, 100), now);
        assert_eq!(tracker.active_sessions(), 2);

        // Equidistant detection (60px from each) completes the first
        // session: it already holds one sample, the second would need two.
        let out = tracker.observe(&f, &bbox_at(160, 100), now);
        assert!(matches!(out, TrackOutcome::Completed { .. }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_completes_exactly_once_at_target() {
        let (tracker, calls, _) = tracker(config(1, 3));
        let f = frame();
        let now = Instant::now();
        let bbox = bbox_at(300, 200);

        assert_eq!(
            tracker.observe(&f, &bbox, now),
            TrackOutcome::Sampling {
                captured: 1,
                target: 3
            }
        );
        assert_eq!(
            tracker.observe(&f, &bbox, now),
            TrackOutcome::Sampling {
                captured: 2,
                target: 3
            }
        );

        let out = tracker.observe(&f, &bbox, now);
        match out {
            TrackOutcome::Completed { stored, .. } => assert!(stored.is_some()),
            other => panic!("expected completion, got {other:?}"),
        }

        // The session is gone and its anchor is blacklisted: no premature
        // or double completion is possible.
        assert_eq!(tracker.active_sessions(), 0);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(tracker.observe(&f, &bbox, now), TrackOutcome::Cooldown);
    }

    #[test]
    fn test_interval_3_target_5_completes_after_15_observations() {
        let (tracker, calls, _) = tracker(config(3, 5));
        let f = frame();
        let now = Instant::now();
        let bbox = bbox_at(300, 200);

        for i in 1..15 {
            let out = tracker.observe(&f, &bbox, now);
            assert!(
                matches!(out, TrackOutcome::Sampling { .. }),
                "observation {i} should still be sampling"
            );
        }
        let out = tracker.observe(&f, &bbox, now);
        assert!(matches!(out, TrackOutcome::Completed { .. }));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 5, "exactly 5 samples must be stored");
    }

    #[test]
    fn test_cooldown_blocks_then_expires() {
        let cfg = TrackerConfig {
            capture_cooldown: Duration::from_secs(60),
            ..config(1, 1)
        };
        let (tracker, _, _) = tracker(cfg);
        let f = frame();
        let t0 = Instant::now();
        let bbox = bbox_at(300, 200);

        // Single-sample target: completes immediately.
        assert!(matches!(
            tracker.observe(&f, &bbox, t0),
            TrackOutcome::Completed { .. }
        ));

        // Half-way through the cooldown: suppressed, no state touched.
        let out = tracker.observe(&f, &bbox, t0 + Duration::from_secs(30));
        assert_eq!(out, TrackOutcome::Cooldown);
        assert_eq!(tracker.active_sessions(), 0);

        // Past the cooldown: the entry expires and a fresh session starts.
        let out = tracker.observe(&f, &bbox, t0 + Duration::from_secs(61));
        assert!(matches!(out, TrackOutcome::Completed { .. }));
        assert_eq!(tracker.cooldown_entries(), 1); // old entry swept, new one added
    }

    #[test]
    fn test_sweep_discards_stale_session_without_storing() {
        let cfg = TrackerConfig {
            session_timeout: Duration::from_secs(3),
            ..config(1, 100)
        };
        let (tracker, calls, _) = tracker(cfg);
        let f = frame();
        let t0 = Instant::now();

        tracker.observe(&f, &bbox_at(300, 200), t0);
        assert_eq!(tracker.sweep_expired(t0 + Duration::from_secs(2)), 0);
        assert_eq!(tracker.sweep_expired(t0 + Duration::from_secs(4)), 1);

        assert_eq!(tracker.active_sessions(), 0);
        assert!(calls.lock().unwrap().is_empty(), "partials must not be stored");
    }

    #[test]
    fn test_sweep_keeps_recently_seen_session() {
        let cfg = TrackerConfig {
            session_timeout: Duration::from_secs(3),
            ..config(1, 100)
        };
        let (tracker, _, _) = tracker(cfg);
        let f = frame();
        let t0 = Instant::now();

        tracker.observe(&f, &bbox_at(300, 200), t0);
        tracker.observe(&f, &bbox_at(300, 200), t0 + Duration::from_secs(2));
        assert_eq!(tracker.sweep_expired(t0 + Duration::from_secs(4)), 0);
        assert_eq!(tracker.active_sessions(), 1);
    }

    #[test]
    fn test_store_failure_still_applies_cooldown() {
        let (tracker, calls, fail) = tracker(config(1, 1));
        fail.store(true, Ordering::Relaxed);
        let f = frame();
        let now = Instant::now();
        let bbox = bbox_at(300, 200);

        match tracker.observe(&f, &bbox, now) {
            TrackOutcome::Completed { stored, .. } => assert!(stored.is_none()),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
        // Finalize is attempted at most once; the anchor is still cooled down.
        assert_eq!(tracker.observe(&f, &bbox, now), TrackOutcome::Cooldown);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_below_minimum_viable_is_failure_not_stored() {
        let cfg = TrackerConfig {
            min_viable_samples: 3,
            ..config(1, 2)
        };
        let (tracker, calls, _) = tracker(cfg);
        let f = frame();
        let now = Instant::now();
        let bbox = bbox_at(300, 200);

        tracker.observe(&f, &bbox, now);
        match tracker.observe(&f, &bbox, now) {
            TrackOutcome::Completed { stored, .. } => assert!(stored.is_none()),
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(tracker.observe(&f, &bbox, now), TrackOutcome::Cooldown);
    }

    #[test]
    fn test_progress_label() {
        let out = TrackOutcome::Sampling {
            captured: 3,
            target: 5,
        };
        assert_eq!(out.progress_label().as_deref(), Some("3/5"));
        assert!(TrackOutcome::Cooldown.progress_label().is_none());
    }
}
