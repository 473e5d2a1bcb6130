use super::Recorded;
use guardrail_circuitbreaker::{CircuitBreaker, CircuitState};
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn force_open_rejects_until_window_elapses() {
    let recorded = Recorded::default();
    let breaker = CircuitBreaker::builder()
        .name("aweber")
        .reset_timeout(Duration::from_secs(15))
        .metrics_sink(recorded.sink())
        .build();

    breaker.force_open().await;
    assert_eq!(breaker.state().await, CircuitState::Open);
    assert!(breaker
        .execute(|| async { Ok::<_, &str>(()) })
        .await
        .unwrap_err()
        .is_circuit_open());

    advance(Duration::from_secs(15)).await;
    assert!(breaker.execute(|| async { Ok::<_, &str>(()) }).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert_eq!(
        recorded.events(),
        vec![
            "circuit_open",
            "circuit_open_block",
            "circuit_half_open",
            "circuit_closed"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn reset_closes_and_clears_counters() {
    let breaker = CircuitBreaker::builder()
        .name("stripe")
        .failure_threshold(2)
        .build();

    for _ in 0..2 {
        let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
    }
    assert_eq!(breaker.state().await, CircuitState::Open);

    breaker.reset().await;
    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failures, 0);
    assert_eq!(snapshot.since_last_failure, None);

    let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

/// Successes while closed do not clear earlier failures; only a verified
/// close does.
#[tokio::test(start_paused = true)]
async fn failures_split_by_successes_still_open() {
    let recorded = Recorded::default();
    let breaker = CircuitBreaker::builder()
        .name("mailchimp")
        .failure_threshold(3)
        .metrics_sink(recorded.sink())
        .build();

    for _ in 0..2 {
        let _ = breaker.execute(|| async { Err::<(), _>("flaky") }).await;
    }
    breaker
        .execute(|| async { Ok::<_, &str>(()) })
        .await
        .unwrap();

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failures, 2);

    let _ = breaker.execute(|| async { Err::<(), _>("flaky") }).await;
    assert_eq!(breaker.state().await, CircuitState::Open);
    assert_eq!(recorded.count("circuit_open"), 1);
    assert_eq!(recorded.count("circuit_closed"), 0);

    let labels = recorded.labels_of("circuit_failure");
    assert_eq!(labels[2][1], ("failures", "3".to_string()));
}

#[tokio::test(start_paused = true)]
async fn snapshot_tracks_time_since_failure() {
    let breaker = CircuitBreaker::builder()
        .name("youtube-api")
        .failure_threshold(3)
        .build();

    let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
    advance(Duration::from_secs(4)).await;

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.failures, 1);
    assert_eq!(snapshot.since_last_failure, Some(Duration::from_secs(4)));
}
