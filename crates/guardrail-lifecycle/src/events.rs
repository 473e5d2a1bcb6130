use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How a tracked request left the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    /// The caller finished with the request.
    Completed,
    /// The request was cancelled explicitly or by `cancel_all`.
    Cancelled,
    /// The request's timer fired.
    TimedOut,
}

/// Events emitted by a [`RequestTracker`](crate::RequestTracker).
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A request was registered.
    Started {
        pattern_name: String,
        timestamp: Instant,
        id: Uuid,
        timeout: Duration,
    },
    /// A request was removed. Emitted exactly once per `Started`.
    Finished {
        pattern_name: String,
        timestamp: Instant,
        id: Uuid,
        outcome: RequestOutcome,
        elapsed: Duration,
    },
}

impl ResilienceEvent for LifecycleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::Started { .. } => "started",
            LifecycleEvent::Finished { .. } => "finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            LifecycleEvent::Started { timestamp, .. }
            | LifecycleEvent::Finished { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            LifecycleEvent::Started { pattern_name, .. }
            | LifecycleEvent::Finished { pattern_name, .. } => pattern_name,
        }
    }
}
