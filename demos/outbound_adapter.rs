//! A provider adapter guarded end to end.
//!
//! A simulated mailing-list provider fails its first few calls. Each request
//! is tracked by a `RequestTracker`, runs through an `OutboundGuard`
//! (breaker, time bound, retry), and breaker events go to a printing metrics
//! sink. Set `RUST_LOG=debug` to see the retry and breaker logs.
//!
//! Run with: cargo run --example outbound_adapter

use guardrail::core::Label;
use guardrail::lifecycle::RequestTracker;
use guardrail::{OutboundGuard, ResilienceError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum ProviderError {
    Unavailable,
    Unauthorized,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unavailable => write!(f, "503 service unavailable"),
            ProviderError::Unauthorized => write!(f, "401 unauthorized"),
        }
    }
}

/// Simulated provider failing its first `fail_first` calls.
#[derive(Clone)]
struct MailingListApi {
    calls: Arc<AtomicU32>,
    fail_first: u32,
    revoked: bool,
}

impl MailingListApi {
    async fn lists(&self, account: &str) -> Result<Vec<String>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.revoked {
            return Err(ProviderError::Unauthorized);
        }
        if call <= self.fail_first {
            println!("  provider call {} -> 503", call);
            return Err(ProviderError::Unavailable);
        }
        println!("  provider call {} -> 200", call);
        Ok(vec![format!("{}-weekly", account), format!("{}-launches", account)])
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let guard: OutboundGuard<ProviderError> = OutboundGuard::builder("mailchimp")
        .failure_threshold(2)
        .reset_timeout(Duration::from_secs(1))
        .timeout(Duration::from_secs(2))
        .max_retries(3)
        .base_delay(Duration::from_millis(50))
        .retry_on(|err: &ProviderError| matches!(err, ProviderError::Unavailable))
        .metrics_sink(|event: &'static str, labels: &[Label]| {
            println!("  metric {} {:?}", event, labels);
        })
        .build();
    let tracker = RequestTracker::builder()
        .name("mailchimp-adapter")
        .on_finished(|id, outcome| println!("  request {} finished: {:?}", id, outcome))
        .build();

    println!("1. transient failures are retried inside one call");
    let api = MailingListApi {
        calls: Arc::new(AtomicU32::new(0)),
        fail_first: 2,
        revoked: false,
    };
    let result = tracker
        .run(Duration::from_secs(5), |token| {
            let guard = guard.clone();
            let api = api.clone();
            async move {
                guard
                    .call_with_signal(|| api.lists("acme"), &token)
                    .await
            }
        })
        .await;
    println!("  result: {:?}\n", result);

    println!("2. a revoked token is not retried, and two such calls open the breaker");
    let revoked = MailingListApi {
        calls: Arc::new(AtomicU32::new(0)),
        fail_first: 0,
        revoked: true,
    };
    for _ in 0..3 {
        match guard.call(|| revoked.lists("acme")).await {
            Ok(lists) => println!("  lists: {:?}", lists),
            Err(ResilienceError::CircuitOpen { name }) => {
                println!("  {} breaker is open, call skipped", name)
            }
            Err(err) => println!("  error: {}", err),
        }
    }
    println!();

    println!("3. after the reset window a probe closes the breaker again");
    tokio::time::sleep(Duration::from_secs(1)).await;
    let healthy = MailingListApi {
        calls: Arc::new(AtomicU32::new(0)),
        fail_first: 0,
        revoked: false,
    };
    let result = guard.call(|| healthy.lists("acme")).await;
    println!("  result: {:?}", result.map_err(|e| e.to_string()));
    println!("  breaker state: {}", guard.breaker().state().await);
}
