use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for pipeline runtime behavior.
///
/// Decouples the orchestration loop from specific output mechanisms so the
/// CLI, a GUI, or tests can watch throughput and queue health without
/// changing the loop itself.
pub trait PipelineLogger: Send {
    /// Record a point-in-time metric (fps, queue drops, frame latency).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used where the caller has its
/// own progress reporting, and by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: accumulates metrics and reports averages at the
/// end of the run through the `log` crate.
pub struct StdoutPipelineLogger {
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Pipeline summary ({elapsed:.1}s):")];

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let values = &self.metrics[name];
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            lines.push(format!("  {name}: avg {avg:.1} ({} samples)", values.len()));
        }

        Some(lines.join("\n"))
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
