use guardrail_timelimiter::{TimeLimiter, TimeLimiterConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{Layer, ServiceExt};

#[tokio::test(start_paused = true)]
async fn listeners_see_each_outcome_once() {
    let successes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let timeouts: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));

    let s = Arc::clone(&successes);
    let e = Arc::clone(&errors);
    let t = Arc::clone(&timeouts);
    let limiter = TimeLimiterConfig::builder()
        .name("youtube-api")
        .timeout_duration(Duration::from_millis(100))
        .on_success(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .on_timeout(move |bound| t.lock().unwrap().push(bound))
        .build();

    let _ = limiter.execute(async { Ok::<_, &str>(()) }).await;
    let _ = limiter.execute(async { Err::<(), _>("403") }).await;
    let _ = limiter
        .execute(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, &str>(())
        })
        .await;

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(*timeouts.lock().unwrap(), vec![Duration::from_millis(100)]);
}

#[test]
fn builder_clamps_configured_bound() {
    let limiter = TimeLimiterConfig::builder()
        .name("stripe")
        .timeout_duration(Duration::from_secs(900))
        .build();
    assert_eq!(limiter.config().bound(), Duration::from_secs(300));
    assert_eq!(limiter.config().name(), "stripe");
}

#[tokio::test(start_paused = true)]
async fn layered_service_is_bounded() {
    let limiter = TimeLimiter::with_bound(Duration::from_millis(250));
    let slow = limiter.layer().layer(tower::service_fn(|delay_ms: u64| async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok::<_, std::io::Error>(delay_ms)
    }));

    assert_eq!(slow.clone().oneshot(100).await.unwrap(), 100);
    let err = slow.oneshot(1_000).await.unwrap_err();
    assert_eq!(err.bound(), Some(Duration::from_millis(250)));
}
