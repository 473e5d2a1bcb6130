use super::ProviderError;
use guardrail_retry::{
    ExponentialBackoff, FnInterval, IntervalFunction, JitteredBackoff, RetryConfig,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn fixed_backoff_spaces_attempts() {
    let seen: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let retry = RetryConfig::builder()
        .max_retries(2)
        .fixed_backoff(Duration::from_millis(200))
        .build();

    let _: Result<(), ProviderError> = retry
        .execute(move || {
            s.lock().unwrap().push(Instant::now());
            async { Err(ProviderError::Unavailable) }
        })
        .await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1] - seen[0], Duration::from_millis(200));
    assert_eq!(seen[2] - seen[1], Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn exponential_backoff_doubles() {
    let delays: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
    let d = Arc::clone(&delays);
    let retry = RetryConfig::builder()
        .max_retries(4)
        .exponential_backoff(Duration::from_millis(100))
        .on_retry(move |_, delay| d.lock().unwrap().push(delay))
        .build();

    let start = Instant::now();
    let _: Result<(), ProviderError> = retry
        .execute(|| async { Err(ProviderError::Unavailable) })
        .await;

    let expected: Vec<Duration> = [100, 200, 400, 800]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(*delays.lock().unwrap(), expected);
    assert_eq!(start.elapsed(), Duration::from_millis(1_500));
}

#[test]
fn jittered_backoff_stays_within_window() {
    let backoff = JitteredBackoff::new(Duration::from_millis(100));
    for attempt in 0..6 {
        let base = 100u64 << attempt;
        for _ in 0..50 {
            let delay = backoff.next_interval(attempt).as_millis() as u64;
            assert!(
                (base..=base + 100).contains(&delay),
                "attempt {} produced {}ms",
                attempt,
                delay
            );
        }
    }
}

#[test]
fn jittered_backoff_respects_cap() {
    let backoff = JitteredBackoff::new(Duration::from_millis(100)).max_interval(Duration::from_secs(1));
    for _ in 0..50 {
        let delay = backoff.next_interval(20);
        assert!(delay >= Duration::from_secs(1));
        assert!(delay <= Duration::from_millis(1_100));
    }
}

#[test]
fn exponential_cap_applies() {
    let backoff = ExponentialBackoff::new(Duration::from_millis(500))
        .multiplier(3.0)
        .max_interval(Duration::from_secs(2));
    assert_eq!(backoff.next_interval(0), Duration::from_millis(500));
    assert_eq!(backoff.next_interval(1), Duration::from_millis(1_500));
    assert_eq!(backoff.next_interval(2), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn custom_interval_function() {
    let retry = RetryConfig::builder()
        .max_retries(3)
        .backoff(FnInterval::new(|attempt| Duration::from_secs(attempt as u64 + 1)))
        .build();

    let start = Instant::now();
    let _: Result<(), ProviderError> = retry
        .execute(|| async { Err(ProviderError::Unavailable) })
        .await;

    assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 3));
}
