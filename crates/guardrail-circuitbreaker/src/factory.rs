//! Binds a plain async function to its own breaker.

use crate::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use std::future::Future;
use std::sync::Arc;

/// Wraps `operation` in a dedicated breaker named `name`.
///
/// The breaker uses the 30 second default reset window. Build a
/// [`CircuitBreaker`] yourself and use [`ProtectedFn::with_breaker`] to change
/// it.
///
/// Keep the returned value for the lifetime of the process: every call to
/// `protect` creates an independent breaker with no shared history.
pub fn protect<F>(operation: F, failure_threshold: u32, name: impl Into<String>) -> ProtectedFn<F> {
    let breaker = CircuitBreakerConfig::builder()
        .name(name)
        .failure_threshold(failure_threshold)
        .build();
    ProtectedFn::with_breaker(operation, breaker)
}

/// An async function guarded by a circuit breaker.
///
/// `call` takes the same argument as the wrapped function. Functions of several
/// arguments take a tuple. Clones share both the function and the breaker.
pub struct ProtectedFn<F> {
    operation: Arc<F>,
    breaker: CircuitBreaker,
}

impl<F> ProtectedFn<F> {
    /// Guards `operation` with an existing breaker.
    pub fn with_breaker(operation: F, breaker: CircuitBreaker) -> Self {
        Self {
            operation: Arc::new(operation),
            breaker,
        }
    }

    /// The breaker guarding this function.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Calls the wrapped function through the breaker.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let operation = &*self.operation;
        self.breaker.execute(|| operation(args)).await
    }
}

impl<F> Clone for ProtectedFn<F> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            breaker: self.breaker.clone(),
        }
    }
}

impl<F> std::fmt::Debug for ProtectedFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedFn")
            .field("breaker", &self.breaker)
            .finish_non_exhaustive()
    }
}
