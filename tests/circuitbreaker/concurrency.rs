use super::Recorded;
use guardrail_circuitbreaker::{CircuitBreaker, CircuitState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Many failing callers racing past the threshold open the circuit once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_open_once() {
    let recorded = Recorded::default();
    let breaker = CircuitBreaker::builder()
        .name("mailchimp")
        .failure_threshold(5)
        .metrics_sink(recorded.sink())
        .build();

    let mut handles = Vec::new();
    for _ in 0..64 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move {
            breaker
                .execute(|| async {
                    tokio::task::yield_now().await;
                    Err::<(), _>("503")
                })
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }

    assert_eq!(breaker.state().await, CircuitState::Open);
    assert_eq!(recorded.count("circuit_open"), 1);
    assert_eq!(recorded.count("circuit_half_open"), 0);

    // Every call was either recorded as a failure or rejected up front.
    let failures = recorded.count("circuit_failure");
    let blocked = recorded.count("circuit_open_block");
    assert!(failures >= 5);
    assert_eq!(failures + blocked, 64);
    assert_eq!(breaker.snapshot().await.failures as usize, failures);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_successes_keep_circuit_closed() {
    let recorded = Recorded::default();
    let invocations = Arc::new(AtomicUsize::new(0));
    let breaker = CircuitBreaker::builder()
        .name("stripe")
        .failure_threshold(3)
        .metrics_sink(recorded.sink())
        .build();

    let mut handles = Vec::new();
    for i in 0..100 {
        let breaker = breaker.clone();
        let invocations = Arc::clone(&invocations);
        handles.push(tokio::spawn(async move {
            breaker
                .execute(|| async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &str>(i)
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(invocations.load(Ordering::SeqCst), 100);
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert!(recorded.events().is_empty());
}

/// Clones observe transitions made through any other clone.
#[tokio::test(start_paused = true)]
async fn clones_share_state_across_tasks() {
    let breaker = CircuitBreaker::builder()
        .name("youtube-api")
        .failure_threshold(2)
        .reset_timeout(Duration::from_secs(10))
        .build();

    let tripper = breaker.clone();
    tokio::spawn(async move {
        for _ in 0..2 {
            let _ = tripper.execute(|| async { Err::<(), _>("quota") }).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(breaker.state().await, CircuitState::Open);
    let err = breaker
        .execute(|| async { Ok::<_, &str>(()) })
        .await
        .unwrap_err();
    assert!(err.is_circuit_open());
}
