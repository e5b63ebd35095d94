//! Bounded retry for commands that lose a conditional write.

use crate::config::RetryConfig;
use crate::error::BayError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    max: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.base_backoff_ms),
            max: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Exponential ceiling with full jitter, so tasks that collided do not collide again
    /// in lockstep.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let ceiling = exp.min(self.max);
        ceiling.mul_f64(fastrand::f64())
    }

    /// Run `op` until it succeeds, fails with a terminal error, or runs out of attempts.
    ///
    /// `op` is handed the attempt number and must re-read whatever it depends on; only
    /// [`BayError::is_retryable`] errors are retried. The last conflict is returned when
    /// the budget is spent.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, BayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BayError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    debug!(operation, attempt, ?delay, error = %e, "Retrying after conflict");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "Retries exhausted");
                    return Err(e);
                }
                result => return result,
            }
        }
    }
}
