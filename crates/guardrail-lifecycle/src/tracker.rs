use crate::error::LifecycleError;
use crate::events::{LifecycleEvent, RequestOutcome};
use dashmap::DashMap;
use guardrail_core::{EventListeners, FnListener};
use std::future::Future;
use std::sync::{Arc, OnceLock, Weak};
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

struct Entry {
    token: CancellationToken,
    timer: Option<AbortHandle>,
    outcome: Arc<OnceLock<RequestOutcome>>,
    started: Instant,
}

struct Inner {
    name: String,
    requests: DashMap<Uuid, Entry>,
    event_listeners: EventListeners<LifecycleEvent>,
}

impl Inner {
    /// Removes `id` and settles it with `outcome`.
    ///
    /// Only the caller whose `remove` returns the entry does any work, so each
    /// request is settled exactly once whichever path gets here first.
    fn finish(&self, id: Uuid, outcome: RequestOutcome) -> bool {
        let Some((_, entry)) = self.requests.remove(&id) else {
            return false;
        };

        if let Some(timer) = &entry.timer {
            timer.abort();
        }
        // Outcome first: whoever wakes on the token reads it.
        let _ = entry.outcome.set(outcome);
        if outcome != RequestOutcome::Completed {
            entry.token.cancel();
        }

        let elapsed = entry.started.elapsed();

        #[cfg(feature = "tracing")]
        {
            if outcome == RequestOutcome::TimedOut {
                warn!(
                    tracker = %self.name,
                    request_id = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "request timed out"
                );
            } else {
                debug!(tracker = %self.name, request_id = %id, ?outcome, "request finished");
            }
        }

        self.event_listeners.emit(&LifecycleEvent::Finished {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
            id,
            outcome,
            elapsed,
        });
        true
    }
}

/// Tracks in-flight outbound requests.
///
/// Each request gets a [`CancellationToken`] and a timer that cancels it after
/// the request's timeout. The pairing is removed exactly once: on completion,
/// on [`cancel`](Self::cancel) / [`cancel_all`](Self::cancel_all), or when the
/// timer fires, whichever happens first.
///
/// Cloning is cheap and clones share the same registry.
#[derive(Clone)]
pub struct RequestTracker {
    inner: Arc<Inner>,
}

impl RequestTracker {
    /// Creates a tracker with no listeners.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    /// Creates a new builder.
    pub fn builder() -> RequestTrackerBuilder {
        RequestTrackerBuilder::new()
    }

    /// Tracker name used in events and logs.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registers a new request whose token fires after `timeout`.
    ///
    /// Dropping the returned guard completes the request.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn begin(&self, timeout: Duration) -> TrackedRequest {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let outcome = Arc::new(OnceLock::new());

        self.inner.event_listeners.emit(&LifecycleEvent::Started {
            pattern_name: self.inner.name.clone(),
            timestamp: Instant::now(),
            id,
            timeout,
        });

        self.inner.requests.insert(
            id,
            Entry {
                token: token.clone(),
                timer: None,
                outcome: Arc::clone(&outcome),
                started: Instant::now(),
            },
        );

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let watched = token.clone();
        let timer = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = tokio::time::sleep(timeout) => RequestOutcome::TimedOut,
                _ = watched.cancelled() => RequestOutcome::Cancelled,
            };
            if let Some(inner) = weak.upgrade() {
                inner.finish(id, outcome);
            }
        })
        .abort_handle();

        // The request may already be settled if the timer or a cancel won the race.
        match self.inner.requests.get_mut(&id) {
            Some(mut entry) => entry.timer = Some(timer),
            None => timer.abort(),
        }

        TrackedRequest {
            id,
            token,
            outcome,
            tracker: Arc::clone(&self.inner),
        }
    }

    /// Runs `operation` as a tracked request.
    ///
    /// The operation receives the request's token and should pass it to any
    /// cancellable work it starts. It is dropped as soon as the token fires.
    pub async fn run<F, Fut, T, E>(
        &self,
        timeout: Duration,
        operation: F,
    ) -> Result<T, LifecycleError<E>>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let request = self.begin(timeout);
        let id = request.id;
        let token = request.token.clone();
        let work = operation(token.clone());

        let result = tokio::select! {
            biased;
            result = work => Some(result),
            _ = token.cancelled() => None,
        };

        match result {
            Some(result) => {
                request.complete();
                result.map_err(LifecycleError::Inner)
            }
            None => match request.settle(RequestOutcome::Cancelled) {
                RequestOutcome::TimedOut => Err(LifecycleError::TimedOut { id, after: timeout }),
                _ => Err(LifecycleError::Cancelled { id }),
            },
        }
    }

    /// Cancels one request. Returns false if it was no longer tracked.
    pub fn cancel(&self, id: Uuid) -> bool {
        self.inner.finish(id, RequestOutcome::Cancelled)
    }

    /// Cancels every tracked request and empties the registry.
    ///
    /// Returns how many requests this call cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<Uuid> = self.inner.requests.iter().map(|entry| *entry.key()).collect();
        let cancelled = ids
            .into_iter()
            .filter(|id| self.inner.finish(*id, RequestOutcome::Cancelled))
            .count();

        #[cfg(feature = "tracing")]
        debug!(tracker = %self.inner.name, cancelled, "cancelled all requests");

        cancelled
    }

    /// Number of requests in flight.
    pub fn len(&self) -> usize {
        self.inner.requests.len()
    }

    /// True when nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.inner.requests.is_empty()
    }

    /// True if `id` is still in flight.
    pub fn contains(&self, id: Uuid) -> bool {
        self.inner.requests.contains_key(&id)
    }
}

impl std::fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestTracker")
            .field("name", &self.inner.name)
            .field("in_flight", &self.inner.requests.len())
            .finish()
    }
}

/// Guard for one tracked request. Dropping it completes the request.
pub struct TrackedRequest {
    id: Uuid,
    token: CancellationToken,
    outcome: Arc<OnceLock<RequestOutcome>>,
    tracker: Arc<Inner>,
}

impl TrackedRequest {
    /// The locally generated request id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Token cancelled on timeout or explicit cancellation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// How the request was settled, if it has been.
    pub fn outcome(&self) -> Option<RequestOutcome> {
        self.outcome.get().copied()
    }

    /// True once the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Marks the request complete and removes it from the tracker.
    pub fn complete(self) {
        self.tracker.finish(self.id, RequestOutcome::Completed);
    }

    fn settle(&self, outcome: RequestOutcome) -> RequestOutcome {
        self.tracker.finish(self.id, outcome);
        self.outcome().unwrap_or(outcome)
    }
}

impl Drop for TrackedRequest {
    fn drop(&mut self) {
        self.tracker.finish(self.id, RequestOutcome::Completed);
    }
}

impl std::fmt::Debug for TrackedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedRequest")
            .field("id", &self.id)
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// Builder for [`RequestTracker`].
pub struct RequestTrackerBuilder {
    name: String,
    event_listeners: EventListeners<LifecycleEvent>,
}

impl Default for RequestTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTrackerBuilder {
    /// Creates a builder named `"<unnamed>"`.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Names the tracker, usually after the adapter owning it.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Called with the id and timeout of every new request.
    pub fn on_started<F>(mut self, f: F) -> Self
    where
        F: Fn(Uuid, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let LifecycleEvent::Started { id, timeout, .. } = event {
                f(*id, *timeout);
            }
        }));
        self
    }

    /// Called once per request when it leaves the tracker.
    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Uuid, RequestOutcome) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let LifecycleEvent::Finished { id, outcome, .. } = event {
                f(*id, *outcome);
            }
        }));
        self
    }

    /// Builds the tracker.
    pub fn build(self) -> RequestTracker {
        RequestTracker {
            inner: Arc::new(Inner {
                name: self.name,
                requests: DashMap::new(),
                event_listeners: self.event_listeners,
            }),
        }
    }
}
