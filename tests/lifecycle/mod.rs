//! Integration tests for the request lifecycle tracker.
//!
//! - registry.rs: begin, complete, cancel and timeouts
//! - contention.rs: exactly-once removal under concurrent settlement


use guardrail_lifecycle::{RequestOutcome, RequestTracker, Uuid};
use std::sync::{Arc, Mutex};

pub(crate) type Finished = Arc<Mutex<Vec<(Uuid, RequestOutcome)>>>;

/// A tracker that records every `Finished` event.
pub(crate) fn recording_tracker(name: &str) -> (RequestTracker, Finished) {
    let finished: Finished = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::clone(&finished);
    let tracker = RequestTracker::builder()
        .name(name)
        .on_finished(move |id, outcome| f.lock().unwrap().push((id, outcome)))
        .build();
    (tracker, finished)
}
