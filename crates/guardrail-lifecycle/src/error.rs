use guardrail_core::ResilienceError;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by [`RequestTracker::run`](crate::RequestTracker::run).
#[derive(Debug, Error)]
pub enum LifecycleError<E> {
    /// The request was cancelled through the tracker or its token.
    #[error("request {id} was cancelled")]
    Cancelled { id: Uuid },

    /// The request's timer fired first.
    #[error("request {id} timed out after {after:?}")]
    TimedOut { id: Uuid, after: Duration },

    /// The operation finished and failed.
    #[error("{0}")]
    Inner(E),
}

impl<E> LifecycleError<E> {
    /// True for [`LifecycleError::TimedOut`].
    pub fn is_timed_out(&self) -> bool {
        matches!(self, LifecycleError::TimedOut { .. })
    }

    /// True for [`LifecycleError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LifecycleError::Cancelled { .. })
    }

    /// Returns the operation's error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            LifecycleError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<LifecycleError<E>> for ResilienceError<E> {
    fn from(err: LifecycleError<E>) -> Self {
        match err {
            LifecycleError::Cancelled { .. } => ResilienceError::Cancelled,
            LifecycleError::TimedOut { after, .. } => ResilienceError::Timeout { bound: after },
            LifecycleError::Inner(e) => ResilienceError::Application(e),
        }
    }
}
