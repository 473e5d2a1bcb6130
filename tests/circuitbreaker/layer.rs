use guardrail_circuitbreaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};

#[tokio::test(start_paused = true)]
async fn layer_rejects_without_calling_inner_service() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let breaker = CircuitBreaker::builder()
        .name("mailchimp")
        .failure_threshold(2)
        .build();

    let mut service = ServiceBuilder::new()
        .layer(breaker.layer())
        .service_fn(move |status: u16| {
            c.fetch_add(1, Ordering::SeqCst);
            async move {
                if status >= 500 {
                    Err(status)
                } else {
                    Ok(status)
                }
            }
        });

    for _ in 0..2 {
        let err = service.ready().await.unwrap().call(503).await.unwrap_err();
        assert!(matches!(err, CircuitBreakerError::Inner(503)));
    }
    let err = service.ready().await.unwrap().call(200).await.unwrap_err();

    assert!(err.is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.breaker().state().await, CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn successful_responses_pass_through() {
    let breaker = CircuitBreaker::builder().name("stripe").build();
    let service = breaker
        .layer()
        .layer(tower::service_fn(|id: u64| async move {
            Ok::<_, std::io::Error>(format!("ch_{}", id))
        }));

    let response = service.oneshot(7).await.unwrap();
    assert_eq!(response, "ch_7");
    assert_eq!(breaker.state().await, CircuitState::Closed);
}
