//! Bounded timeout guard for outbound calls.
//!
//! [`with_timeout`] races an operation against a timer and fails with
//! [`TimeLimiterError::Timeout`] if the timer wins. The bound is always clamped
//! to `[1ms, 300s]`, so a zero or absurdly large configuration value can
//! neither fire instantly nor hang a caller.
//!
//! The timer is owned by the returned future and is dropped as soon as the race
//! is decided, whichever side wins. The guarded operation is not signalled;
//! pass a cancellation token into it if the underlying work must stop.
//!
//! ```rust
//! use guardrail_timelimiter::with_timeout;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let slow = async {
//!     tokio::time::sleep(Duration::from_secs(60)).await;
//!     Ok::<_, std::io::Error>("uploaded")
//! };
//!
//! let err = with_timeout(slow, Duration::from_millis(10)).await.unwrap_err();
//! assert!(err.is_timeout());
//! # }
//! ```
//!
//! ## Named limiter
//!
//! ```rust
//! use guardrail_timelimiter::TimeLimiterConfig;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let limiter = TimeLimiterConfig::builder()
//!     .name("mailchimp")
//!     .timeout_duration(Duration::from_secs(10))
//!     .on_timeout(|bound| eprintln!("mailchimp call exceeded {:?}", bound))
//!     .build();
//!
//! let lists = limiter
//!     .execute(async { Ok::<_, std::io::Error>(vec!["newsletter"]) })
//!     .await;
//! assert!(lists.is_ok());
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use error::TimeLimiterError;
pub use events::TimeLimiterEvent;
pub use layer::{TimeLimiterLayer, TimeLimiterService};

mod config;
mod error;
mod events;
mod layer;

/// Smallest bound the guard will use.
pub const MIN_BOUND: Duration = Duration::from_millis(1);

/// Largest bound the guard will use.
pub const MAX_BOUND: Duration = Duration::from_millis(300_000);

/// Clamps `bound` into `[MIN_BOUND, MAX_BOUND]`.
pub fn clamp_bound(bound: Duration) -> Duration {
    bound.clamp(MIN_BOUND, MAX_BOUND)
}

/// Runs `future` with an upper time bound.
///
/// Resolves with the future's own result if it completes within
/// `clamp_bound(bound)`, otherwise with [`TimeLimiterError::Timeout`].
pub async fn with_timeout<F, T, E>(future: F, bound: Duration) -> Result<T, TimeLimiterError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    let bound = clamp_bound(bound);
    match tokio::time::timeout(bound, future).await {
        Ok(result) => result.map_err(TimeLimiterError::Inner),
        Err(_elapsed) => Err(TimeLimiterError::Timeout { bound }),
    }
}

/// A named timeout guard with event listeners.
///
/// Cloning is cheap and clones share the configuration.
#[derive(Clone)]
pub struct TimeLimiter {
    config: Arc<TimeLimiterConfig>,
}

impl TimeLimiter {
    /// Creates a limiter from a built configuration.
    pub fn new(config: TimeLimiterConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Shortcut for an unnamed limiter with the given bound.
    pub fn with_bound(bound: Duration) -> Self {
        TimeLimiterConfig::builder().timeout_duration(bound).build()
    }

    /// The limiter configuration.
    pub fn config(&self) -> &TimeLimiterConfig {
        &self.config
    }

    /// Wraps this limiter in a tower layer.
    pub fn layer(&self) -> TimeLimiterLayer {
        TimeLimiterLayer::new(self.clone())
    }

    /// Runs `future` under this limiter's bound, emitting one event per call.
    pub async fn execute<F, T, E>(&self, future: F) -> Result<T, TimeLimiterError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let config = &self.config;
        let start = Instant::now();
        let result = with_timeout(future, config.bound).await;
        let duration = start.elapsed();

        let event = match &result {
            Ok(_) => {
                #[cfg(feature = "tracing")]
                debug!(
                    timelimiter = %config.name,
                    duration_ms = duration.as_millis() as u64,
                    "call completed within bound"
                );
                TimeLimiterEvent::Success {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                }
            }
            Err(TimeLimiterError::Inner(_)) => {
                #[cfg(feature = "tracing")]
                debug!(
                    timelimiter = %config.name,
                    duration_ms = duration.as_millis() as u64,
                    "call failed within bound"
                );
                TimeLimiterEvent::Error {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                }
            }
            Err(TimeLimiterError::Timeout { bound }) => {
                #[cfg(feature = "tracing")]
                warn!(
                    timelimiter = %config.name,
                    bound_ms = bound.as_millis() as u64,
                    "call timed out"
                );
                TimeLimiterEvent::Timeout {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    bound: *bound,
                }
            }
        };
        config.event_listeners.emit(&event);

        result
    }
}

impl std::fmt::Debug for TimeLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeLimiter")
            .field("name", &self.config.name)
            .field("bound", &self.config.bound)
            .finish()
    }
}
