//! Exponential backoff with jitter for any fallible asynchronous operation.
//!
//! The engine holds no state between calls; build one [`RetryOptions`](struct.RetryOptions.html)
//! and reuse it, or construct one per call.

use log::warn;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;

/// Upper bound of the random jitter, as a fraction of the computed delay.
pub const JITTER_RATIO: f64 = 0.1;

pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
pub type RetryObserver<E> = Arc<dyn Fn(u32, Duration, &E) + Send + Sync>;

/// Tuning for [`retry_with_backoff`](fn.retry_with_backoff.html)
pub struct RetryOptions<E> {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    should_retry: RetryPredicate<E>,
    on_retry: Option<RetryObserver<E>>,
}

impl<E> RetryOptions<E> {
    /// Default timings (3 attempts, 1s initial delay, 30s cap, factor 2) with a custom predicate.
    pub fn new<P>(should_retry: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            should_retry: Arc::new(should_retry),
            on_retry: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_should_retry<P>(mut self, should_retry: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Called with `(attempt, delay, error)` before sleeping ahead of the next attempt.
    pub fn with_on_retry<O>(mut self, on_retry: O) -> Self
    where
        O: Fn(u32, Duration, &E) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(on_retry));
        self
    }

    /// Delay before the attempt following `attempt` (1-based), without jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        if capped.is_finite() && capped > 0.0 {
            Duration::from_millis(capped as u64)
        } else {
            Duration::from_millis(0)
        }
    }

    /// Longest total time spent sleeping between attempts, jitter included.
    pub fn max_total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.backoff_delay(attempt).mul_f64(1.0 + JITTER_RATIO))
            .sum()
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        RetryOptions {
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            backoff_factor: self.backoff_factor,
            should_retry: Arc::clone(&self.should_retry),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .finish()
    }
}

/// Retries network failures, timeouts and 5xx responses; never 4xx.
impl Default for RetryOptions<TransportError> {
    fn default() -> Self {
        RetryOptions::new(TransportError::is_transient)
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let max_jitter = delay.as_secs_f64() * JITTER_RATIO;
    if max_jitter <= 0.0 {
        return delay;
    }
    let jitter = rand::rng().random_range(0.0..=max_jitter);
    delay + Duration::from_secs_f64(jitter)
}

/// Run `operation` until it succeeds, the predicate rejects its error, or attempts run out.
///
/// Only the final outcome is returned; intermediate failures are logged and
/// passed to the `on_retry` observer.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    options: &RetryOptions<E>,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !(options.should_retry)(&err) {
                    return Err(err);
                }
                let delay = with_jitter(options.backoff_delay(attempt));
                warn!(
                    "attempt {} failed ({}), retrying in {}ms",
                    attempt,
                    err,
                    delay.as_millis()
                );
                if let Some(on_retry) = &options.on_retry {
                    on_retry(attempt, delay, &err);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
