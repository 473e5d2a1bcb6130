use crate::{TimeLimiter, TimeLimiterError};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// A tower [`Layer`] applying a [`TimeLimiter`] to every call of the inner service.
///
/// ```rust
/// use guardrail_timelimiter::TimeLimiter;
/// use tower::{Layer, service_fn};
/// use std::time::Duration;
///
/// let layer = TimeLimiter::with_bound(Duration::from_secs(2)).layer();
/// let svc = layer.layer(service_fn(|req: String| async move {
///     Ok::<_, std::io::Error>(req)
/// }));
/// ```
#[derive(Clone, Debug)]
pub struct TimeLimiterLayer {
    limiter: TimeLimiter,
}

impl TimeLimiterLayer {
    /// Creates a layer sharing `limiter`.
    pub fn new(limiter: TimeLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for TimeLimiterLayer {
    type Service = TimeLimiterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeLimiterService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Service produced by [`TimeLimiterLayer`].
#[derive(Clone, Debug)]
pub struct TimeLimiterService<S> {
    inner: S,
    limiter: TimeLimiter,
}

impl<S, Req> Service<Req> for TimeLimiterService<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = TimeLimiterError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeLimiterError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let fut = self.inner.call(req);
        let limiter = self.limiter.clone();
        Box::pin(async move { limiter.execute(fut).await })
    }
}
