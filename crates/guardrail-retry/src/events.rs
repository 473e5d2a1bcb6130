use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`Retry`](crate::Retry) executor.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one is scheduled after `delay`.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        /// 1-indexed retry number about to be made.
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded, possibly after retries.
    Success {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The retry budget ran out; the last error was returned.
    Error {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The error was classified as non-retryable.
    IgnoredError {
        pattern_name: String,
        timestamp: Instant,
    },
    /// The cancellation signal fired.
    Cancelled {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::Error { .. } => "Error",
            RetryEvent::IgnoredError { .. } => "IgnoredError",
            RetryEvent::Cancelled { .. } => "Cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Success { pattern_name, .. }
            | RetryEvent::Error { pattern_name, .. }
            | RetryEvent::IgnoredError { pattern_name, .. }
            | RetryEvent::Cancelled { pattern_name, .. } => pattern_name,
        }
    }
}
