use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use crate::{CIRCUIT_CLOSED, CIRCUIT_FAILURE, CIRCUIT_HALF_OPEN, CIRCUIT_OPEN, CIRCUIT_OPEN_BLOCK};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    Closed,
    /// Calls are rejected until the reset window has elapsed.
    Open,
    /// A limited number of probe calls pass through; a failure reopens the circuit.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Point-in-time view of a breaker, taken under its lock.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Failures since the last verified close.
    pub failures: u32,
    /// Consecutive successes counted toward closing.
    pub success_count: u32,
    /// Time since the most recent failure, if one was recorded since the last close.
    pub since_last_failure: Option<Duration>,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

/// In-flight probe accounting for the current half-open episode.
///
/// Kept behind its own short-lived lock so a probe dropped mid-flight can give
/// its slot back from `Drop`, without the async circuit lock.
#[derive(Default)]
pub(crate) struct ProbeSlots {
    inner: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    episode: u64,
    in_flight: u32,
}

impl ProbeSlots {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_episode(&self) {
        let mut slots = self.lock();
        slots.episode = slots.episode.wrapping_add(1);
        slots.in_flight = 0;
    }

    fn in_flight(&self) -> u32 {
        self.lock().in_flight
    }

    fn take(self: &Arc<Self>) -> ProbePermit {
        let mut slots = self.lock();
        slots.in_flight = slots.in_flight.saturating_add(1);
        ProbePermit {
            slots: Arc::clone(self),
            episode: slots.episode,
        }
    }

    fn release(&self, episode: u64) {
        let mut slots = self.lock();
        // A probe from an earlier episode has nothing left to give back.
        if slots.episode == episode {
            slots.in_flight = slots.in_flight.saturating_sub(1);
        }
    }
}

/// A half-open probe slot, returned when dropped.
pub(crate) struct ProbePermit {
    slots: Arc<ProbeSlots>,
    episode: u64,
}

impl Drop for ProbePermit {
    fn drop(&mut self) {
        self.slots.release(self.episode);
    }
}

/// Admission granted by [`Circuit::try_acquire`]. Hold it until the outcome
/// has been recorded.
pub(crate) struct Permit {
    _probe: Option<ProbePermit>,
}

pub(crate) struct Circuit {
    state: CircuitState,
    failures: u32,
    success_count: u32,
    last_failure: Option<Instant>,
    last_state_change: Instant,
    probes: Arc<ProbeSlots>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            success_count: 0,
            last_failure: None,
            last_state_change: Instant::now(),
            probes: Arc::default(),
        }
    }
}

impl Circuit {
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            state: self.state,
            failures: self.failures,
            success_count: self.success_count,
            since_last_failure: self.last_failure.map(|at| at.elapsed()),
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    /// Decides whether a call may proceed, moving Open to HalfOpen once the
    /// reset window has elapsed.
    ///
    /// While half-open, at most `half_open_max_attempts` probes are admitted
    /// before the episode is decided; further calls are rejected as if open.
    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> Option<Permit> {
        if self.state == CircuitState::Open {
            let window_elapsed = self
                .last_failure
                .map_or(true, |at| at.elapsed() >= config.reset_timeout);

            if !window_elapsed {
                self.reject(config);
                return None;
            }

            self.transition_to(CircuitState::HalfOpen, config);
        }

        let probe = if self.state == CircuitState::HalfOpen {
            let claimed = self.probes.in_flight().saturating_add(self.success_count);
            if claimed >= config.half_open_max_attempts {
                self.reject(config);
                return None;
            }
            Some(self.probes.take())
        } else {
            None
        };

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });
        Some(Permit { _probe: probe })
    }

    fn reject(&self, config: &CircuitBreakerConfig) {
        config.emit_metric(CIRCUIT_OPEN_BLOCK, &[("name", config.name.clone())]);
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallRejected {
                pattern_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
            });
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) {
        match self.state {
            CircuitState::HalfOpen => {
                self.success_count = self.success_count.saturating_add(1);
                if self.success_count >= config.half_open_max_attempts {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            // Failures only clear on a verified close, so nothing to write.
            CircuitState::Closed => {}
            // A call admitted before the circuit opened; its success proves nothing.
            CircuitState::Open => {}
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        self.failures = self.failures.saturating_add(1);
        self.success_count = 0;
        self.last_failure = Some(Instant::now());

        config.emit_metric(
            CIRCUIT_FAILURE,
            &[
                ("name", config.name.clone()),
                ("failures", self.failures.to_string()),
            ],
        );
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
                failures: self.failures,
            });

        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            CircuitState::Closed if self.failures >= config.failure_threshold => {
                self.transition_to(CircuitState::Open, config)
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }

    pub(crate) fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.last_failure = Some(Instant::now());
        self.transition_to(CircuitState::Open, config);
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.clear_counters();
    }

    fn clear_counters(&mut self) {
        self.failures = 0;
        self.success_count = 0;
        self.last_failure = None;
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        {
            if state == CircuitState::Open {
                tracing::warn!(
                    breaker = %config.name,
                    from = %from_state,
                    failures = self.failures,
                    "circuit opened"
                );
            } else {
                tracing::info!(
                    breaker = %config.name,
                    from = %from_state,
                    to = %state,
                    "circuit state transition"
                );
            }
        }

        let event = match state {
            CircuitState::Open => CIRCUIT_OPEN,
            CircuitState::HalfOpen => CIRCUIT_HALF_OPEN,
            CircuitState::Closed => CIRCUIT_CLOSED,
        };
        config.emit_metric(event, &[("name", config.name.clone())]);

        self.state = state;
        self.last_state_change = Instant::now();
        self.success_count = 0;
        match state {
            CircuitState::Closed => self.clear_counters(),
            CircuitState::HalfOpen => self.probes.start_episode(),
            CircuitState::Open => {}
        }
    }
}
