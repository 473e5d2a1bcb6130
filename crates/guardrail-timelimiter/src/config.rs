//! Configuration for a named time limiter.

use crate::events::TimeLimiterEvent;
use crate::{clamp_bound, TimeLimiter};
use guardrail_core::{EventListeners, FnListener};
use std::time::Duration;

/// Immutable settings shared by every clone of a [`TimeLimiter`].
pub struct TimeLimiterConfig {
    pub(crate) bound: Duration,
    pub(crate) event_listeners: EventListeners<TimeLimiterEvent>,
    pub(crate) name: String,
}

impl TimeLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeLimiterConfigBuilder {
        TimeLimiterConfigBuilder::new()
    }

    /// The effective (clamped) bound.
    pub fn bound(&self) -> Duration {
        self.bound
    }

    /// The limiter name used in events and logs.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`TimeLimiterConfig`].
pub struct TimeLimiterConfigBuilder {
    bound: Duration,
    event_listeners: EventListeners<TimeLimiterEvent>,
    name: String,
}

impl TimeLimiterConfigBuilder {
    /// Creates a builder with a 5 second bound.
    pub fn new() -> Self {
        Self {
            bound: Duration::from_secs(5),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the upper time bound.
    ///
    /// The value is clamped to `[1ms, 300s]` when the limiter is built.
    ///
    /// Default: 5 seconds
    pub fn timeout_duration(mut self, bound: Duration) -> Self {
        self.bound = bound;
        self
    }

    /// Names this limiter for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Called with the elapsed time when an operation succeeds in time.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Success { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Called with the elapsed time when an operation fails in time.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Error { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Called with the clamped bound when an operation times out.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Timeout { bound, .. } = event {
                f(*bound);
            }
        }));
        self
    }

    /// Builds the configuration without wrapping it in a limiter.
    pub fn build_config(self) -> TimeLimiterConfig {
        TimeLimiterConfig {
            bound: clamp_bound(self.bound),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds a [`TimeLimiter`].
    pub fn build(self) -> TimeLimiter {
        TimeLimiter::new(self.build_config())
    }
}

impl Default for TimeLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
