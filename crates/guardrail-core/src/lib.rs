//! Shared infrastructure for the guardrail resilience toolkit.
//!
//! Every pattern crate (timelimiter, retry, circuitbreaker, lifecycle) builds on
//! the pieces defined here:
//! - [`events`]: listener registry used for per-instance callbacks
//! - [`metrics`]: the injected [`MetricsSink`] capability
//! - [`error`]: [`ResilienceError`], one error type for a composed call path
//! - [`Cancelled`]: the marker raised when an external cancellation signal fires

pub mod error;
pub mod events;
pub mod metrics;

pub use error::{Cancelled, ResilienceError};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
#[cfg(feature = "metrics")]
pub use metrics::RecorderSink;
pub use metrics::{Label, MetricsSink, NoopSink, SharedSink};
