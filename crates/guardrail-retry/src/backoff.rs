use rand::Rng;
use std::time::Duration;

/// Computes the delay before a retry.
///
/// `attempt` is 0-indexed: the delay before the first retry is
/// `next_interval(0)`.
pub trait IntervalFunction: Send + Sync {
    /// Delay before retry number `attempt + 1`.
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Same delay before every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a fixed interval.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// `initial * multiplier^attempt`, optionally capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff doubling on every attempt.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the growth factor.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps the computed interval.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    fn base_interval(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        let cap = self.max_interval.unwrap_or(Duration::MAX);
        // Duration::from_secs_f64 panics on overflow; saturate at the cap instead.
        if !secs.is_finite() || secs >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        self.base_interval(attempt)
    }
}

/// Exponential backoff plus a random amount in `[0, jitter]`.
///
/// Callers retrying the same failing target spread out instead of retrying in
/// lockstep. This is the default strategy for [`with_retry`](crate::with_retry).
#[derive(Debug, Clone)]
pub struct JitteredBackoff {
    exponential: ExponentialBackoff,
    jitter: Duration,
}

impl JitteredBackoff {
    /// Doubles from `base` and adds up to `base` of jitter, capped at 30 seconds.
    pub fn new(base: Duration) -> Self {
        Self {
            exponential: ExponentialBackoff::new(base).max_interval(Duration::from_secs(30)),
            jitter: base,
        }
    }

    /// Sets the maximum random amount added to each delay.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps the exponential part of the delay.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.exponential = self.exponential.max_interval(max_interval);
        self
    }
}

impl IntervalFunction for JitteredBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let base = self.exponential.base_interval(attempt);
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return base;
        }
        let extra = rand::rng().random_range(0..=jitter_ms);
        base.saturating_add(Duration::from_millis(extra))
    }
}

/// Closure-based interval.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}
