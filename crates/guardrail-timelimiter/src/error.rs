use guardrail_core::ResilienceError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the timeout guard.
#[derive(Debug, Error)]
pub enum TimeLimiterError<E> {
    /// The operation did not finish within `bound`.
    #[error("operation timed out after {bound:?}")]
    Timeout {
        /// The clamped bound that was exceeded.
        bound: Duration,
    },

    /// The operation finished in time but failed.
    #[error("inner operation error: {0}")]
    Inner(E),
}

impl<E> TimeLimiterError<E> {
    /// Returns true if the bound was exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout { .. })
    }

    /// Returns the bound that was exceeded, if this is a timeout.
    pub fn bound(&self) -> Option<Duration> {
        match self {
            TimeLimiterError::Timeout { bound } => Some(*bound),
            TimeLimiterError::Inner(_) => None,
        }
    }

    /// Returns the operation's own error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeLimiterError::Timeout { .. } => None,
            TimeLimiterError::Inner(e) => Some(e),
        }
    }
}

impl<E> From<TimeLimiterError<E>> for ResilienceError<E> {
    fn from(err: TimeLimiterError<E>) -> Self {
        match err {
            TimeLimiterError::Timeout { bound } => ResilienceError::Timeout { bound },
            TimeLimiterError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
