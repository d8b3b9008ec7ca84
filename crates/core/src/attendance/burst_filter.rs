use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Short-window in-process dedup for identity events.
///
/// Distinct from the business cooldown the durable log applies: this only
/// absorbs the bursts a camera produces when the same face sits in front of
/// it for a few seconds, so the log is not hammered with redundant commits.
pub struct BurstFilter {
    window: Duration,
    last_seen: HashMap<String, Instant>,
}

impl BurstFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Returns whether the event should be forwarded. Only forwarded
    /// events refresh the entry, so a sustained burst re-forwards at most
    /// once per window measured from the last forwarded event.
    pub fn accept(&mut self, name: &str, now: Instant) -> bool {
        let within_window = self
            .last_seen
            .get(name)
            .is_some_and(|&last| now.duration_since(last) < self.window);
        if !within_window {
            self.last_seen.insert(name.to_string(), now);
        }
        !within_window
    }

    /// Drops entries older than twice the window.
    pub fn prune(&mut self, now: Instant) {
        let horizon = self.window * 2;
        self.last_seen
            .retain(|_, &mut last| now.duration_since(last) <= horizon);
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
