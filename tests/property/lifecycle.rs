//! Property tests for the lifecycle tracker.
//!
//! Invariants tested:
//! - Every begun request is settled exactly once, whatever mix of completion,
//!   cancellation and timeout settles it
//! - The registry is empty once everything has settled

use super::paused_runtime;
use guardrail_lifecycle::{RequestOutcome, RequestTracker};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Action {
    Complete,
    Cancel,
    Timeout,
    Drop,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Complete),
        Just(Action::Cancel),
        Just(Action::Timeout),
        Just(Action::Drop),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn every_request_settles_once(
        actions in prop::collection::vec(action(), 1..40),
        sweep in any::<bool>(),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let finished: Arc<Mutex<HashMap<_, Vec<RequestOutcome>>>> =
                Arc::new(Mutex::new(HashMap::new()));
            let f = Arc::clone(&finished);
            let tracker = RequestTracker::builder()
                .name("prop")
                .on_finished(move |id, outcome| {
                    f.lock().unwrap().entry(id).or_default().push(outcome);
                })
                .build();

            let mut waiting = Vec::new();
            for action in &actions {
                let request = tracker.begin(Duration::from_millis(100));
                match action {
                    Action::Complete => request.complete(),
                    Action::Cancel => {
                        prop_assert!(tracker.cancel(request.id()));
                        prop_assert_eq!(request.outcome(), Some(RequestOutcome::Cancelled));
                    }
                    Action::Timeout => waiting.push(request),
                    Action::Drop => drop(request),
                }
            }

            if sweep {
                tracker.cancel_all();
            } else {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }

            for request in &waiting {
                let expected = if sweep { RequestOutcome::Cancelled } else { RequestOutcome::TimedOut };
                prop_assert_eq!(request.outcome(), Some(expected));
            }
            drop(waiting);

            prop_assert!(tracker.is_empty());
            let finished = finished.lock().unwrap();
            prop_assert_eq!(finished.len(), actions.len());
            prop_assert!(finished.values().all(|outcomes| outcomes.len() == 1));
            Ok(())
        })?;
    }
}
