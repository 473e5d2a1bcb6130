use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use crate::CircuitBreaker;
use guardrail_core::{EventListeners, FnListener, Label, MetricsSink, NoopSink, SharedSink};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Reset window used when none is configured.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`CircuitBreaker`].
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) failure_threshold: u32,
    pub(crate) reset_timeout: Duration,
    pub(crate) half_open_max_attempts: u32,
    pub(crate) metrics: SharedSink,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Name of the breaker target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Failures that open a closed circuit.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Minimum time an open circuit stays open.
    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Consecutive successes needed to close a half-open circuit.
    pub fn half_open_max_attempts(&self) -> u32 {
        self.half_open_max_attempts
    }

    pub(crate) fn emit_metric(&self, event: &'static str, labels: &[Label]) {
        self.metrics.emit(event, labels);
    }
}

impl fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("reset_timeout", &self.reset_timeout)
            .field("half_open_max_attempts", &self.half_open_max_attempts)
            .field("event_listeners", &self.event_listeners)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    half_open_max_attempts: u32,
    metrics: SharedSink,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - name: `"<unnamed>"`
    /// - failure_threshold: 5
    /// - reset_timeout: 30 seconds
    /// - half_open_max_attempts: 1
    /// - metrics: no-op sink
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            failure_threshold: 5,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            half_open_max_attempts: 1,
            metrics: NoopSink::shared(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Names the breaker target. Used as the `name` metric label.
    ///
    /// Use one breaker per external target and reuse it; a new breaker with
    /// the same name starts with no history.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Failures since the last close that open the circuit.
    ///
    /// Values below 1 are raised to 1.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Minimum time an open circuit rejects calls before allowing a probe.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Consecutive successes required while half-open before closing.
    ///
    /// While closed, the same number of consecutive successes clears the
    /// failure count. Values below 1 are raised to 1.
    pub fn half_open_max_attempts(mut self, attempts: u32) -> Self {
        self.half_open_max_attempts = attempts.max(1);
        self
    }

    /// Sets the metrics sink receiving `circuit_*` events.
    pub fn metrics_sink<M>(mut self, sink: M) -> Self
    where
        M: MetricsSink + 'static,
    {
        self.metrics = Arc::new(sink);
        self
    }

    /// Sets an already shared metrics sink.
    pub fn shared_metrics_sink(mut self, sink: SharedSink) -> Self {
        self.metrics = sink;
        self
    }

    /// Called with `(from, to)` on every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Called with the current state when a call is permitted.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Called when a call is rejected because the circuit is open.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallRejected { .. } = event {
                f();
            }
        }));
        self
    }

    /// Called with the state after a success is recorded.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Called with the state and failure count after a failure is recorded.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded {
                state, failures, ..
            } = event
            {
                f(*state, *failures);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build_config(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            failure_threshold: self.failure_threshold,
            reset_timeout: self.reset_timeout,
            half_open_max_attempts: self.half_open_max_attempts,
            metrics: self.metrics,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds a [`CircuitBreaker`].
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self.build_config())
    }
}
