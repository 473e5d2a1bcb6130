use super::ProviderError;
use guardrail::lifecycle::{LifecycleError, RequestOutcome, RequestTracker};
use guardrail::{OutboundGuard, ResilienceError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn guard() -> OutboundGuard<ProviderError> {
    OutboundGuard::builder("youtube-api")
        .failure_threshold(3)
        .max_retries(5)
        .base_delay(Duration::from_secs(1))
        .build()
}

#[tokio::test(start_paused = true)]
async fn tracked_call_completes() {
    let tracker = RequestTracker::new("youtube-adapter");
    let guard = guard();

    let result: Result<_, LifecycleError<ResilienceError<ProviderError>>> = tracker
        .run(Duration::from_secs(30), |token| {
            let guard = guard.clone();
            async move {
                guard
                    .call_with_signal(|| async { Ok::<_, ProviderError>("UC123") }, &token)
                    .await
            }
        })
        .await;

    assert_eq!(result.unwrap(), "UC123");
    assert!(tracker.is_empty());
}

/// The tracker's deadline stops a guarded call that is still backing off.
#[tokio::test(start_paused = true)]
async fn tracker_deadline_stops_retrying() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let tracker = RequestTracker::new("youtube-adapter");
    let guard = guard();

    let err = tracker
        .run(Duration::from_millis(1_500), |token| {
            let guard = guard.clone();
            async move {
                guard
                    .call_with_signal(
                        move || {
                            c.fetch_add(1, Ordering::SeqCst);
                            async { Err::<(), _>(ProviderError::new(503)) }
                        },
                        &token,
                    )
                    .await
            }
        })
        .await
        .unwrap_err();

    assert!(err.is_timed_out());
    assert!(calls.load(Ordering::SeqCst) <= 2);
    assert!(tracker.is_empty());
}

/// Shutting the adapter down cancels in-flight calls; the guard sees the
/// cancellation through the shared token.
#[tokio::test(start_paused = true)]
async fn cancel_all_reaches_guarded_calls() {
    let outcomes: Arc<Mutex<Vec<RequestOutcome>>> = Arc::new(Mutex::new(Vec::new()));
    let o = Arc::clone(&outcomes);
    let tracker = RequestTracker::builder()
        .name("mailchimp-adapter")
        .on_finished(move |_, outcome| o.lock().unwrap().push(outcome))
        .build();
    let guard = OutboundGuard::<ProviderError>::builder("mailchimp")
        .max_retries(10)
        .base_delay(Duration::from_secs(5))
        .build();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let request = tracker.begin(Duration::from_secs(300));
        let guard = guard.clone();
        handles.push(tokio::spawn(async move {
            let token = request.token().clone();
            let result = guard
                .call_with_signal(|| async { Err::<(), _>(ProviderError::new(500)) }, &token)
                .await;
            drop(request);
            result
        }));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(tracker.cancel_all(), 3);

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }
    assert_eq!(*outcomes.lock().unwrap(), vec![RequestOutcome::Cancelled; 3]);
}
