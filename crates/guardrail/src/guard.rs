use guardrail_circuitbreaker::{CircuitBreaker, CircuitBreakerError, DEFAULT_RESET_TIMEOUT};
use guardrail_core::{MetricsSink, ResilienceError, SharedSink};
use guardrail_retry::{CancellationToken, JitteredBackoff, Retry, RetryConfig, DEFAULT_BASE_DELAY};
use guardrail_timelimiter::{TimeLimiter, TimeLimiterConfig, TimeLimiterError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type Classifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Breaker, time bound and retry composed around one provider.
///
/// Cloning is cheap; clones share the breaker.
pub struct OutboundGuard<E> {
    breaker: CircuitBreaker,
    limiter: TimeLimiter,
    retry: Retry<ResilienceError<E>>,
}

impl<E> Clone for OutboundGuard<E> {
    fn clone(&self) -> Self {
        Self {
            breaker: self.breaker.clone(),
            limiter: self.limiter.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<E> std::fmt::Debug for OutboundGuard<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundGuard")
            .field("breaker", &self.breaker)
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish()
    }
}

impl<E> OutboundGuard<E> {
    /// Starts building a guard for the provider `name`.
    pub fn builder(name: impl Into<String>) -> OutboundGuardBuilder<E> {
        OutboundGuardBuilder::new(name)
    }

    /// The breaker gating this provider.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Runs `operation` through the breaker, the time bound and the retry loop.
    pub async fn call<Op, Fut, T>(&self, operation: Op) -> Result<T, ResilienceError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_inner(operation, None).await
    }

    /// Like [`call`](Self::call), but the retry loop also stops when `signal`
    /// fires.
    pub async fn call_with_signal<Op, Fut, T>(
        &self,
        operation: Op,
        signal: &CancellationToken,
    ) -> Result<T, ResilienceError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_inner(operation, Some(signal)).await
    }

    async fn call_inner<Op, Fut, T>(
        &self,
        mut operation: Op,
        signal: Option<&CancellationToken>,
    ) -> Result<T, ResilienceError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempt = move || {
            let fut = operation();
            async move { fut.await.map_err(ResilienceError::Application) }
        };

        let retry = &self.retry;
        let limiter = &self.limiter;
        let result = self
            .breaker
            .execute(|| async move {
                match signal {
                    Some(signal) => {
                        limiter
                            .execute(retry.execute_with_signal(attempt, signal))
                            .await
                    }
                    None => limiter.execute(retry.execute(attempt)).await,
                }
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(CircuitBreakerError::OpenCircuit { name }) => {
                Err(ResilienceError::CircuitOpen { name })
            }
            Err(CircuitBreakerError::Inner(TimeLimiterError::Timeout { bound })) => {
                Err(ResilienceError::Timeout { bound })
            }
            Err(CircuitBreakerError::Inner(TimeLimiterError::Inner(err))) => Err(err),
        }
    }
}

/// Builder for [`OutboundGuard`].
pub struct OutboundGuardBuilder<E> {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    timeout: Duration,
    max_retries: usize,
    base_delay: Duration,
    retry_on: Option<Classifier<E>>,
    metrics: Option<SharedSink>,
}

impl<E> OutboundGuardBuilder<E> {
    /// Defaults: threshold 5, reset 30s, timeout 30s, 2 retries from 100ms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: 5,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            base_delay: DEFAULT_BASE_DELAY,
            retry_on: None,
            metrics: None,
        }
    }

    /// Failures that open the breaker.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Time the breaker stays open before probing.
    pub fn reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout = reset_timeout;
        self
    }

    /// Bound on the whole call, retries included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries after the first attempt.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay of the jittered exponential backoff.
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Only application errors accepted by `predicate` are retried.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Some(Arc::new(predicate));
        self
    }

    /// Sink receiving the breaker's `circuit_*` events.
    pub fn metrics_sink<M>(mut self, sink: M) -> Self
    where
        M: MetricsSink + 'static,
    {
        self.metrics = Some(Arc::new(sink));
        self
    }

    /// Builds the guard.
    pub fn build(self) -> OutboundGuard<E>
    where
        E: 'static,
    {
        let mut breaker = CircuitBreaker::builder()
            .name(self.name.clone())
            .failure_threshold(self.failure_threshold)
            .reset_timeout(self.reset_timeout);
        if let Some(sink) = self.metrics {
            breaker = breaker.shared_metrics_sink(sink);
        }

        let limiter = TimeLimiterConfig::builder()
            .name(self.name.clone())
            .timeout_duration(self.timeout)
            .build();

        let mut retry = RetryConfig::builder()
            .name(self.name)
            .max_retries(self.max_retries)
            .backoff(JitteredBackoff::new(self.base_delay));
        if let Some(predicate) = self.retry_on {
            retry = retry.retry_on(move |err: &ResilienceError<E>| match err {
                ResilienceError::Application(e) => predicate(e),
                _ => false,
            });
        }

        OutboundGuard {
            breaker: breaker.build(),
            limiter,
            retry: retry.build(),
        }
    }
}
