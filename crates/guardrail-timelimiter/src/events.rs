//! Events emitted by a [`TimeLimiter`](crate::TimeLimiter).

use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Outcome of one guarded call.
#[derive(Debug, Clone)]
pub enum TimeLimiterEvent {
    /// The operation completed successfully within the bound.
    Success {
        /// Limiter name.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the operation took.
        duration: Duration,
    },
    /// The operation completed within the bound but failed.
    Error {
        /// Limiter name.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the operation took.
        duration: Duration,
    },
    /// The bound elapsed first.
    Timeout {
        /// Limiter name.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The clamped bound.
        bound: Duration,
    },
}

impl ResilienceEvent for TimeLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeLimiterEvent::Success { .. } => "success",
            TimeLimiterEvent::Error { .. } => "error",
            TimeLimiterEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeLimiterEvent::Success { timestamp, .. }
            | TimeLimiterEvent::Error { timestamp, .. }
            | TimeLimiterEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            TimeLimiterEvent::Success { pattern_name, .. }
            | TimeLimiterEvent::Error { pattern_name, .. }
            | TimeLimiterEvent::Timeout { pattern_name, .. } => pattern_name,
        }
    }
}
