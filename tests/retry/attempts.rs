use super::ProviderError;
use guardrail_retry::{with_retry, RetryConfig, RetryOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn always_failing_operation_runs_max_retries_plus_one() {
    for max_retries in [0, 1, 3, 5] {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = with_retry(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Unavailable) }
            },
            RetryOptions::new(max_retries),
        )
        .await;

        assert_eq!(result, Err(ProviderError::Unavailable));
        assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn recovers_on_later_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let result = with_retry(
        move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::Unavailable)
                } else {
                    Ok("campaign-7")
                }
            }
        },
        RetryOptions::new(3),
    )
    .await;

    assert_eq!(result, Ok("campaign-7"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn first_success_makes_one_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let retry = RetryConfig::<ProviderError>::builder()
        .max_retries(4)
        .build();

    let value = retry
        .execute(move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(1) }
        })
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_returns_immediately() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ignored = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let i = Arc::clone(&ignored);
    let retry = RetryConfig::builder()
        .name("mailchimp")
        .max_retries(5)
        .retry_on(|err: &ProviderError| *err == ProviderError::Unavailable)
        .on_ignored_error(move || {
            i.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let result: Result<(), _> = retry
        .execute(move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Unauthorized) }
        })
        .await;

    assert_eq!(result, Err(ProviderError::Unauthorized));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(ignored.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn listeners_report_attempts() {
    let retries: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let exhausted = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&retries);
    let e = Arc::clone(&exhausted);

    let retry = RetryConfig::builder()
        .name("stripe")
        .max_retries(3)
        .fixed_backoff(Duration::from_millis(10))
        .on_retry(move |attempt, _delay| r.lock().unwrap().push(attempt))
        .on_error(move |attempts| {
            e.store(attempts, Ordering::SeqCst);
        })
        .build();

    let result: Result<(), ProviderError> = retry
        .execute(|| async { Err(ProviderError::Unavailable) })
        .await;

    assert!(result.is_err());
    assert_eq!(*retries.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(exhausted.load(Ordering::SeqCst), 4);
}
