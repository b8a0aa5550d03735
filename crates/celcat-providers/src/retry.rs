//! Retry policy for transport failures.
//!
//! [`with_retry`] runs an operation until it succeeds, fails with a
//! non-retryable error, or exhausts the attempt budget. Delays between
//! attempts grow exponentially up to a cap.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::{MAX_BACKOFF_DELAY_SECS, MAX_RETRIES};
use crate::error::{ProviderError, ProviderResult};

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(MAX_BACKOFF_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Creates the default policy with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Builder: set the delay bounds.
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    /// Delay to wait after the failed attempt `attempt` (0-based):
    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `operation` under `policy`.
///
/// The closure receives the 0-based attempt number. Errors for which
/// [`ProviderError::is_retryable`] is false are returned immediately. When
/// the last attempt fails with a retryable error, a connectivity error
/// wrapping it is returned.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> ProviderResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        if attempt + 1 >= max_attempts {
            return Err(ProviderError::connection(format!(
                "Failed after {} attempts: {}",
                max_attempts,
                err.message()
            ))
            .with_source(err));
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "request failed, retrying"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
