//! Adaptive request spacing.
//!
//! A [`RateLimiter`] enforces a minimum interval between the start of two
//! requests. The interval is scaled by a backoff multiplier that grows on
//! transport failures and resets on success.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::config::saturating_secs;

/// Growth factor applied to the multiplier on each failure.
pub const BACKOFF_FACTOR: f64 = 1.5;

/// Upper bound of the backoff multiplier.
pub const MAX_BACKOFF_MULTIPLIER: f64 = 4.0;

/// Spaces out requests sharing one endpoint.
///
/// The check-and-update in [`acquire`](Self::acquire) runs under a single
/// async mutex that is held across the wait, so concurrent callers are
/// granted one at a time and never measure against the same timestamp.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
    multiplier: Mutex<f64>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum interval between calls.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: tokio::sync::Mutex::new(None),
            multiplier: Mutex::new(1.0),
        }
    }

    /// Creates a limiter allowing at most `calls` requests per second.
    ///
    /// A non-positive rate disables spacing.
    pub fn per_second(calls: f64) -> Self {
        let interval = if calls > 0.0 && calls.is_finite() {
            saturating_secs(1.0 / calls)
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    /// Returns the base interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns the current backoff multiplier.
    pub fn backoff_multiplier(&self) -> f64 {
        *self.multiplier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the interval currently enforced between calls.
    pub fn current_interval(&self) -> Duration {
        saturating_secs(self.min_interval.as_secs_f64() * self.backoff_multiplier())
    }

    /// Waits until the current interval has elapsed since the last granted
    /// call, then records now as the last call.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let interval = self.current_interval();
            let elapsed = last.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "rate limiter waiting");
                sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }

    /// Multiplies the backoff by 1.5, capped at 4.
    pub fn increase_backoff(&self) {
        let mut multiplier = self.multiplier.lock().unwrap_or_else(PoisonError::into_inner);
        *multiplier = (*multiplier * BACKOFF_FACTOR).min(MAX_BACKOFF_MULTIPLIER);
        debug!(multiplier = *multiplier, "increased rate limiter backoff");
    }

    /// Resets the backoff multiplier to 1.
    pub fn reset_backoff(&self) {
        let mut multiplier = self.multiplier.lock().unwrap_or_else(PoisonError::into_inner);
        if *multiplier != 1.0 {
            debug!(from = *multiplier, "reset rate limiter backoff");
        }
        *multiplier = 1.0;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn backoff_grows_and_caps() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        assert_eq!(limiter.backoff_multiplier(), 1.0);

        limiter.increase_backoff();
        assert_eq!(limiter.backoff_multiplier(), 1.5);
        limiter.increase_backoff();
        assert_eq!(limiter.backoff_multiplier(), 2.25);
        limiter.increase_backoff();
        assert_eq!(limiter.backoff_multiplier(), 3.375);
        limiter.increase_backoff();
        assert_eq!(limiter.backoff_multiplier(), 4.0);
        limiter.increase_backoff();
        assert_eq!(limiter.backoff_multiplier(), 4.0);

        limiter.reset_backoff();
        assert_eq!(limiter.backoff_multiplier(), 1.0);
    }

    #[test]
    fn per_second_interval() {
        assert_eq!(RateLimiter::per_second(2.0).min_interval(), Duration::from_millis(500));
        assert_eq!(RateLimiter::per_second(0.0).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::default().min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn extreme_rates_saturate() {
        assert_eq!(RateLimiter::per_second(1e-30).min_interval(), Duration::MAX);

        let limiter = RateLimiter::new(Duration::MAX);
        limiter.increase_backoff();
        assert_eq!(limiter.current_interval(), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_acquire_waits_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_scales_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.increase_backoff();
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_after_interval_passed() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        limiter.acquire().await;
        sleep(Duration::from_millis(300)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut granted = Vec::new();
        for handle in handles {
            granted.push(handle.await.unwrap());
        }
        granted.sort();

        for pair in granted.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
        assert!(granted[3] - start >= Duration::from_millis(300));
    }
}
