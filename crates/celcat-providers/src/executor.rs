//! Resilient request executor.
//!
//! Performs one logical HTTP call with:
//! - rate limiting before every attempt, retries included,
//! - a counting admission gate bounding in-flight requests,
//! - classification of non-200 responses into labeled failures,
//! - exponential-backoff retry of transport failures only.
//!
//! A 429 is reported with its `Retry-After` hint but never retried here; the
//! caller decides what to do with it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::classify::{Payload, classify, decode_success};
use crate::config::{CONCURRENT_REQUESTS, TIMEOUT_SECS};
use crate::error::{ProviderError, ProviderResult};
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryPolicy, with_retry};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport, RequestOptions};

/// Executes requests against one logical endpoint.
///
/// The rate limiter and admission gate are shared through `Arc`s, so several
/// executors (or clones of the handles) can throttle against the same
/// budget.
#[derive(Debug)]
pub struct RequestExecutor<T = ReqwestTransport> {
    transport: T,
    rate_limiter: Arc<RateLimiter>,
    admission: Arc<Semaphore>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<T: HttpTransport> RequestExecutor<T> {
    /// Creates an executor with the default retry policy, five concurrent
    /// slots and a 30 second timeout.
    pub fn new(transport: T, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            transport,
            rate_limiter,
            admission: Arc::new(Semaphore::new(CONCURRENT_REQUESTS)),
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    /// Builder: bound in-flight requests to `max` (at least one).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.admission = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Builder: share an existing admission gate.
    pub fn with_admission(mut self, admission: Arc<Semaphore>) -> Self {
        self.admission = admission;
        self
    }

    /// Builder: set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: set the default per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the rate limiter.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Returns the number of free admission slots.
    pub fn available_slots(&self) -> usize {
        self.admission.available_permits()
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs `method url` and returns the decoded body.
    ///
    /// The default timeout and compression are merged beneath `options`;
    /// values the caller set win.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` / `RateLimited` / `ConnectionFailed` for
    ///   non-200 responses, on the first occurrence,
    /// - `ConnectionFailed` wrapping the last transport error once the
    ///   attempt budget is spent,
    /// - `InvalidResponse` if a JSON body does not parse.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> ProviderResult<Payload> {
        let request = HttpRequest::new(method, url, options.merged_over_defaults(self.timeout));
        let request = &request;
        with_retry(&self.policy, move |attempt| self.attempt(request, attempt)).await
    }

    async fn attempt(&self, request: &HttpRequest, attempt: u32) -> ProviderResult<Payload> {
        self.rate_limiter.acquire().await;

        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|e| ProviderError::connection("request gate closed").with_source(e))?;

        debug!(method = %request.method, url = %request.url, attempt, "executing request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_retryable() {
                    self.rate_limiter.increase_backoff();
                }
                return Err(err);
            }
        };

        if response.status != StatusCode::OK {
            return Err(classify(&response));
        }

        let payload = decode_success(&response)?;
        self.rate_limiter.reset_backoff();
        Ok(payload)
    }
}
