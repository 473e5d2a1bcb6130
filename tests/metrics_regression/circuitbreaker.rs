//! Circuit breaker metrics regression tests.

use super::helpers::*;
use guardrail_circuitbreaker::{
    CircuitBreaker, CIRCUIT_CLOSED, CIRCUIT_FAILURE, CIRCUIT_HALF_OPEN, CIRCUIT_OPEN,
    CIRCUIT_OPEN_BLOCK,
};
use guardrail_core::RecorderSink;
use serial_test::serial;
use std::time::Duration;

#[test]
fn event_names_are_stable() {
    assert_eq!(CIRCUIT_OPEN, "circuit_open");
    assert_eq!(CIRCUIT_HALF_OPEN, "circuit_half_open");
    assert_eq!(CIRCUIT_CLOSED, "circuit_closed");
    assert_eq!(CIRCUIT_FAILURE, "circuit_failure");
    assert_eq!(CIRCUIT_OPEN_BLOCK, "circuit_open_block");
}

#[tokio::test(start_paused = true)]
#[serial]
async fn full_cycle_records_every_counter() {
    init_recorder();

    let breaker = CircuitBreaker::builder()
        .name("metrics-full-cycle")
        .failure_threshold(2)
        .reset_timeout(Duration::from_secs(10))
        .metrics_sink(RecorderSink)
        .build();

    for _ in 0..2 {
        let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
    }
    let _ = breaker.execute(|| async { Ok::<_, &str>(()) }).await;
    tokio::time::advance(Duration::from_secs(10)).await;
    let _ = breaker.execute(|| async { Ok::<_, &str>(()) }).await;

    let target = "metrics-full-cycle";
    assert_eq!(counter_for("circuit_failure", target), 2);
    assert_eq!(counter_for("circuit_open", target), 1);
    assert_eq!(counter_for("circuit_open_block", target), 1);
    assert_eq!(counter_for("circuit_half_open", target), 1);
    assert_eq!(counter_for("circuit_closed", target), 1);

    assert_counter_with_labels("circuit_failure", &[("name", target), ("failures", "1")]);
    assert_counter_with_labels("circuit_failure", &[("name", target), ("failures", "2")]);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn breakers_are_labelled_separately() {
    init_recorder();

    let stripe = CircuitBreaker::builder()
        .name("metrics-stripe")
        .failure_threshold(1)
        .metrics_sink(RecorderSink)
        .build();
    let mailchimp = CircuitBreaker::builder()
        .name("metrics-mailchimp")
        .failure_threshold(1)
        .metrics_sink(RecorderSink)
        .build();

    let _ = stripe.execute(|| async { Err::<(), _>("card_declined") }).await;

    assert_eq!(counter_for("circuit_open", "metrics-stripe"), 1);
    assert_eq!(counter_for("circuit_open", "metrics-mailchimp"), 0);
    assert!(mailchimp.execute(|| async { Ok::<_, &str>(()) }).await.is_ok());
}
