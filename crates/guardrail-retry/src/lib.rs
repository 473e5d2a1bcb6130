//! Backoff retry executor.
//!
//! Repeatedly invokes an operation until it succeeds, the error is classified
//! as non-retryable, the cancellation signal fires, or the retry budget runs
//! out. Delays grow exponentially with random jitter so callers retrying the
//! same failing provider do not retry in lockstep.
//!
//! On exhaustion the last error is returned unchanged. A fired cancellation
//! signal is reported as `E::from(Cancelled)`, which is why the error type must
//! implement `From<guardrail_core::Cancelled>`.
//!
//! # Examples
//!
//! ```
//! use guardrail_core::Cancelled;
//! use guardrail_retry::{with_retry, CancellationToken, RetryOptions};
//!
//! #[derive(Debug)]
//! enum UploadError {
//!     Transient,
//!     Cancelled,
//! }
//!
//! impl From<Cancelled> for UploadError {
//!     fn from(_: Cancelled) -> Self {
//!         UploadError::Cancelled
//!     }
//! }
//!
//! # async fn example() {
//! let shutdown = CancellationToken::new();
//! let result = with_retry(
//!     || async { Ok::<_, UploadError>("video-id") },
//!     RetryOptions::new(3).signal(shutdown.clone()),
//! )
//! .await;
//! assert_eq!(result.unwrap(), "video-id");
//! # }
//! ```
//!
//! A configured executor adds naming, error classification and listeners:
//!
//! ```
//! use guardrail_core::Cancelled;
//! use guardrail_retry::RetryConfig;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct HttpError {
//!     status: u16,
//! }
//!
//! impl From<Cancelled> for HttpError {
//!     fn from(_: Cancelled) -> Self {
//!         HttpError { status: 499 }
//!     }
//! }
//!
//! # async fn example() {
//! let retry = RetryConfig::<HttpError>::builder()
//!     .name("aweber-subscribers")
//!     .max_retries(4)
//!     .jittered_backoff(Duration::from_millis(200), Duration::from_millis(100))
//!     .retry_on(|e| e.status == 429 || e.status >= 500)
//!     .on_retry(|attempt, delay| println!("retry {} in {:?}", attempt, delay))
//!     .build();
//!
//! let _ = retry.execute(|| async { Err::<(), _>(HttpError { status: 401 }) }).await;
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod policy;

pub use backoff::{ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction, JitteredBackoff};
pub use config::{RetryConfig, RetryConfigBuilder, DEFAULT_BASE_DELAY};
pub use events::RetryEvent;
pub use policy::{RetryPolicy, RetryPredicate};
pub use tokio_util::sync::CancellationToken;

use guardrail_core::Cancelled;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Per-call options for [`with_retry`].
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Aborts the loop between attempts once cancelled.
    pub signal: Option<CancellationToken>,
}

impl RetryOptions {
    /// Options with `max_retries` and no signal.
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            signal: None,
        }
    }

    /// Attaches a cancellation signal.
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Invokes `operation` at most `max_retries + 1` times with jittered
/// exponential backoff.
pub async fn with_retry<Op, Fut, T, E>(operation: Op, options: RetryOptions) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<Cancelled>,
{
    let mut builder = RetryConfig::builder().max_retries(options.max_retries);
    if let Some(signal) = options.signal {
        builder = builder.signal(signal);
    }
    builder.build().execute(operation).await
}

/// A configured retry executor.
///
/// Cloning is cheap and clones share the configuration.
pub struct Retry<E> {
    config: Arc<RetryConfig<E>>,
}

impl<E> Clone for Retry<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<E> std::fmt::Debug for Retry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("name", &self.config.name)
            .field("max_retries", &self.config.policy.max_retries)
            .finish()
    }
}

impl<E> Retry<E> {
    /// Creates an executor from a built configuration.
    pub fn new(config: RetryConfig<E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The executor configuration.
    pub fn config(&self) -> &RetryConfig<E> {
        &self.config
    }

    /// Runs `operation` under the configured policy and signal.
    pub async fn execute<Op, Fut, T>(&self, operation: Op) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Cancelled>,
    {
        self.run(operation, self.config.signal.as_ref()).await
    }

    /// Runs `operation`, aborting on `signal` instead of the configured one.
    pub async fn execute_with_signal<Op, Fut, T>(
        &self,
        operation: Op,
        signal: &CancellationToken,
    ) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Cancelled>,
    {
        self.run(operation, Some(signal)).await
    }

    async fn run<Op, Fut, T>(
        &self,
        mut operation: Op,
        signal: Option<&CancellationToken>,
    ) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Cancelled>,
    {
        let config = &self.config;
        let mut attempt = 0;

        loop {
            if signal.is_some_and(CancellationToken::is_cancelled) {
                return Err(self.cancelled(attempt));
            }

            let error = match operation().await {
                Ok(value) => {
                    config.event_listeners.emit(&RetryEvent::Success {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });
                    return Ok(value);
                }
                Err(error) => error,
            };

            // Signal fired mid-flight: stop, but keep the operation's own error.
            if signal.is_some_and(CancellationToken::is_cancelled) {
                config.event_listeners.emit(&RetryEvent::Cancelled {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt + 1,
                });
                return Err(error);
            }

            if !config.policy.should_retry(&error) {
                #[cfg(feature = "tracing")]
                debug!(retry = %config.name, "error is not retryable");
                config.event_listeners.emit(&RetryEvent::IgnoredError {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                });
                return Err(error);
            }

            if attempt >= config.policy.max_retries {
                #[cfg(feature = "tracing")]
                warn!(retry = %config.name, attempts = attempt + 1, "retries exhausted");
                config.event_listeners.emit(&RetryEvent::Error {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt + 1,
                });
                return Err(error);
            }

            let delay = config.policy.next_backoff(attempt);
            attempt += 1;

            #[cfg(feature = "tracing")]
            debug!(
                retry = %config.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "scheduling retry"
            );
            config.event_listeners.emit(&RetryEvent::Retry {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                attempt,
                delay,
            });

            match signal {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(self.cancelled(attempt)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    fn cancelled(&self, attempts: usize) -> E
    where
        E: From<Cancelled>,
    {
        #[cfg(feature = "tracing")]
        debug!(retry = %self.config.name, attempts, "retry loop cancelled");
        self.config.event_listeners.emit(&RetryEvent::Cancelled {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            attempts,
        });
        E::from(Cancelled)
    }
}
