//! Error types shared across patterns.
//!
//! Each pattern crate has its own error enum (`CircuitBreakerError`,
//! `TimeLimiterError`, `LifecycleError`). When several patterns are stacked
//! around one outbound call, [`ResilienceError`] gives the caller a single type
//! to match on; every pattern crate provides a `From` conversion into it.
//!
//! ```rust
//! use guardrail_core::ResilienceError;
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("provider returned {status}")]
//! struct ProviderError {
//!     status: u16,
//! }
//!
//! fn describe(err: &ResilienceError<ProviderError>) -> String {
//!     match err {
//!         ResilienceError::Timeout { bound } => format!("gave up after {:?}", bound),
//!         ResilienceError::CircuitOpen { name } => format!("{} is shedding load", name),
//!         ResilienceError::Cancelled => "caller went away".to_string(),
//!         ResilienceError::Application(e) => format!("provider said {}", e.status),
//!     }
//! }
//!
//! let err = ResilienceError::<ProviderError>::Timeout { bound: Duration::from_secs(5) };
//! assert_eq!(describe(&err), "gave up after 5s");
//! ```

use std::time::Duration;
use thiserror::Error;

/// Raised when an external cancellation signal fires.
///
/// Retry loops and the lifecycle tracker convert this into the caller's own
/// error type (`E: From<Cancelled>`), so exhausted or cancelled calls still
/// surface as the caller's taxonomy rather than a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// One error type for a composed resilience stack.
#[derive(Debug, Clone, Error)]
pub enum ResilienceError<E> {
    /// The time bound was exceeded.
    #[error("timed out after {bound:?}")]
    Timeout {
        /// The bound that was exceeded, after clamping.
        bound: Duration,
    },

    /// The breaker for `name` is open and the call was not attempted.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker target.
        name: String,
    },

    /// An external cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The wrapped operation failed.
    #[error("{0}")]
    Application(E),
}

impl<E> ResilienceError<E> {
    /// True for [`ResilienceError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// True for [`ResilienceError::CircuitOpen`].
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// True for [`ResilienceError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResilienceError::Cancelled)
    }

    /// True for [`ResilienceError::Application`].
    pub fn is_application(&self) -> bool {
        matches!(self, ResilienceError::Application(_))
    }

    /// Borrows the application error, if any.
    pub fn application_error(&self) -> Option<&E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Takes the application error, if any.
    pub fn into_application(self) -> Option<E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the application error, leaving the resilience variants untouched.
    pub fn map_application<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::Timeout { bound } => ResilienceError::Timeout { bound },
            ResilienceError::CircuitOpen { name } => ResilienceError::CircuitOpen { name },
            ResilienceError::Cancelled => ResilienceError::Cancelled,
            ResilienceError::Application(e) => ResilienceError::Application(f(e)),
        }
    }
}

impl<E> From<Cancelled> for ResilienceError<E> {
    fn from(_: Cancelled) -> Self {
        ResilienceError::Cancelled
    }
}
