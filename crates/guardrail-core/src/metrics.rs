//! Metrics emission as an injected capability.
//!
//! Patterns never talk to a telemetry backend directly. They hold a
//! [`SharedSink`] and call [`MetricsSink::emit`] with a static event name and a
//! small label set. Tests inject a closure; production code can inject
//! [`RecorderSink`] (feature `metrics`) or its own adapter.

use std::sync::Arc;

/// A `(key, value)` label attached to an emitted event.
pub type Label = (&'static str, String);

/// Receives named events from resilience patterns.
pub trait MetricsSink: Send + Sync {
    /// Records one occurrence of `event` with the given labels.
    fn emit(&self, event: &'static str, labels: &[Label]);
}

/// A sink shared by every clone of a pattern instance.
pub type SharedSink = Arc<dyn MetricsSink>;

impl<F> MetricsSink for F
where
    F: Fn(&'static str, &[Label]) + Send + Sync,
{
    fn emit(&self, event: &'static str, labels: &[Label]) {
        self(event, labels)
    }
}

/// Discards everything. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn emit(&self, _event: &'static str, _labels: &[Label]) {}
}

impl NoopSink {
    /// Returns the no-op sink behind an `Arc`.
    pub fn shared() -> SharedSink {
        Arc::new(NoopSink)
    }
}

/// Forwards every event to a `metrics` counter named after the event.
///
/// `circuit_failure{name="youtube-api", failures="3"}` becomes an increment of
/// the counter `circuit_failure` with those labels, recorded by whatever global
/// recorder the process installed.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderSink;

#[cfg(feature = "metrics")]
impl MetricsSink for RecorderSink {
    fn emit(&self, event: &'static str, labels: &[Label]) {
        let labels: Vec<metrics::Label> = labels
            .iter()
            .map(|(key, value)| metrics::Label::new(*key, value.clone()))
            .collect();
        metrics::counter!(event, labels).increment(1);
    }
}
