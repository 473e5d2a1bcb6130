//! Consecutive-failure circuit breaker for outbound provider calls.
//!
//! One breaker guards one external target (a provider API such as Mailchimp or
//! Stripe). Every call goes through [`CircuitBreaker::execute`], which:
//!
//! 1. takes the breaker lock, decides whether the call may proceed and applies
//!    any Open to HalfOpen transition in the same critical section,
//! 2. rejects with [`CircuitBreakerError::OpenCircuit`] without invoking the
//!    operation when it may not,
//! 3. otherwise runs the operation outside the lock and re-takes the lock to
//!    record the outcome.
//!
//! ## States
//! - **Closed**: calls pass through; `failure_threshold` failures open the circuit
//! - **Open**: calls are rejected until `reset_timeout` has passed since the last failure
//! - **Half-Open**: up to `half_open_max_attempts` probes pass through at a time
//!   and the rest are rejected; that many consecutive successes close the
//!   circuit, any failure reopens it. A probe that is dropped before finishing
//!   gives its slot back.
//! - Failures accumulate while closed; only a verified close or
//!   [`CircuitBreaker::reset`] clears them.
//!
//! Every `Err` from the operation counts as a failure. Deciding which errors are
//! worth retrying belongs to the retry executor layered underneath.
//!
//! ## Usage
//!
//! ```rust
//! use guardrail_circuitbreaker::{CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::builder()
//!     .name("mailchimp")
//!     .failure_threshold(5)
//!     .reset_timeout(Duration::from_secs(30))
//!     .on_state_transition(|from, to| println!("mailchimp breaker {} -> {}", from, to))
//!     .build();
//!
//! let lists = breaker
//!     .execute(|| async { Ok::<_, std::io::Error>(vec!["newsletter"]) })
//!     .await;
//! assert!(lists.is_ok());
//! assert_eq!(breaker.state().await, CircuitState::Closed);
//! # }
//! ```
//!
//! ## Metrics
//!
//! The breaker reports `circuit_open`, `circuit_half_open`, `circuit_closed`,
//! `circuit_failure` and `circuit_open_block` to an injected
//! [`MetricsSink`](guardrail_core::MetricsSink), labelled with the breaker
//! `name` (and `failures` for failures):
//!
//! ```rust
//! use guardrail_circuitbreaker::CircuitBreaker;
//! use guardrail_core::Label;
//!
//! let breaker = CircuitBreaker::builder()
//!     .name("stripe")
//!     .metrics_sink(|event: &'static str, labels: &[Label]| {
//!         println!("{} {:?}", event, labels);
//!     })
//!     .build();
//! ```
//!
//! ## Protecting a function
//!
//! [`protect`] binds an async function to its own breaker:
//!
//! ```rust
//! use guardrail_circuitbreaker::protect;
//!
//! async fn fetch_channel(id: String) -> Result<String, std::io::Error> {
//!     Ok(format!("channel {}", id))
//! }
//!
//! # async fn example() {
//! let fetch = protect(fetch_channel, 3, "youtube-api");
//! let channel = fetch.call("UC123".to_string()).await;
//! assert!(channel.is_ok());
//! # }
//! ```

mod circuit;
mod config;
mod error;
mod events;
mod factory;
mod layer;
#[cfg(feature = "serde")]
mod settings;

pub use circuit::{CircuitSnapshot, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, DEFAULT_RESET_TIMEOUT};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use factory::{protect, ProtectedFn};
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
#[cfg(feature = "serde")]
pub use settings::BreakerSettings;

use crate::circuit::Circuit;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Emitted when a circuit opens.
pub const CIRCUIT_OPEN: &str = "circuit_open";
/// Emitted when an open circuit admits its first probe.
pub const CIRCUIT_HALF_OPEN: &str = "circuit_half_open";
/// Emitted when a half-open circuit closes.
pub const CIRCUIT_CLOSED: &str = "circuit_closed";
/// Emitted on every recorded failure, with the `failures` label.
pub const CIRCUIT_FAILURE: &str = "circuit_failure";
/// Emitted when an open circuit, or a half-open one with no free probe slot,
/// rejects a call.
pub const CIRCUIT_OPEN_BLOCK: &str = "circuit_open_block";

/// A circuit breaker for one external target.
///
/// Cloning is cheap; clones share the same state, so a breaker can be handed
/// to every call site for its target.
#[derive(Clone)]
pub struct CircuitBreaker {
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreaker {
    /// Creates a breaker in the closed state.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuit: Arc::new(Mutex::new(Circuit::default())),
            config: Arc::new(config),
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Name of the breaker target.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The breaker configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Runs `operation` if the circuit permits it and records the outcome.
    ///
    /// The operation is not invoked at all when the call is rejected. If the
    /// returned future is dropped mid-flight nothing is recorded, and a
    /// half-open probe slot held by the call is released.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = {
            let mut circuit = self.circuit.lock().await;
            circuit.try_acquire(&self.config)
        };

        let Some(_permit) = permit else {
            #[cfg(feature = "tracing")]
            debug!(breaker = %self.config.name, "circuit open, call rejected");

            return Err(CircuitBreakerError::OpenCircuit {
                name: self.config.name.clone(),
            });
        };

        let result = operation().await;

        {
            let mut circuit = self.circuit.lock().await;
            match &result {
                Ok(_) => circuit.record_success(&self.config),
                Err(_) => circuit.record_failure(&self.config),
            }
        }

        result.map_err(CircuitBreakerError::Inner)
    }

    /// Returns the current state.
    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state()
    }

    /// Returns a consistent snapshot of the breaker's counters.
    pub async fn snapshot(&self) -> CircuitSnapshot {
        self.circuit.lock().await.snapshot()
    }

    /// Forces the circuit open; the reset window starts now.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.config);
    }

    /// Closes the circuit and clears all counters.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.config);
    }

    /// Wraps this breaker in a tower layer. Every service the layer wraps
    /// shares this breaker's state.
    pub fn layer(&self) -> CircuitBreakerLayer {
        CircuitBreakerLayer::new(self.clone())
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
