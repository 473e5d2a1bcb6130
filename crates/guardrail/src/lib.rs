//! Fault-tolerance toolkit for outbound provider calls.
//!
//! Each pattern is its own crate and a feature of this one:
//!
//! - **Time limiter** (`timelimiter`): bounded timeouts, clamped to `[1ms, 300s]`
//! - **Circuit breaker** (`circuitbreaker`): failure-count breaker plus
//!   the [`protect`](circuitbreaker::protect) factory
//! - **Retry** (`retry`): exponential backoff with jitter and cooperative cancellation
//! - **Lifecycle** (`lifecycle`): request tracker pairing calls with tokens and timers
//!
//! ```toml
//! [dependencies]
//! guardrail = { version = "0.1", features = ["full"] }
//! ```
//!
//! With `circuitbreaker`, `retry` and `timelimiter` enabled, [`OutboundGuard`]
//! composes all three around one provider in the usual order: the breaker gates
//! the call, the time bound covers the whole retry loop, and retries run
//! innermost.
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "circuitbreaker", feature = "retry", feature = "timelimiter"))]
//! # async fn example() {
//! use guardrail::OutboundGuard;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct HttpError {
//!     status: u16,
//! }
//!
//! let mailchimp = OutboundGuard::<HttpError>::builder("mailchimp")
//!     .failure_threshold(5)
//!     .timeout(Duration::from_secs(10))
//!     .max_retries(2)
//!     .retry_on(|e| e.status >= 500)
//!     .build();
//!
//! let result = mailchimp
//!     .call(|| async { Ok::<_, HttpError>("subscribed") })
//!     .await;
//! # }
//! ```

// Re-export core (always available)
pub use guardrail_core as core;
pub use guardrail_core::{Cancelled, ResilienceError};

// Re-export patterns based on features
#[cfg(feature = "circuitbreaker")]
pub use guardrail_circuitbreaker as circuitbreaker;

#[cfg(feature = "lifecycle")]
pub use guardrail_lifecycle as lifecycle;

#[cfg(feature = "retry")]
pub use guardrail_retry as retry;

#[cfg(feature = "timelimiter")]
pub use guardrail_timelimiter as timelimiter;

#[cfg(all(feature = "circuitbreaker", feature = "retry", feature = "timelimiter"))]
mod guard;

#[cfg(all(feature = "circuitbreaker", feature = "retry", feature = "timelimiter"))]
pub use guard::{OutboundGuard, OutboundGuardBuilder};
