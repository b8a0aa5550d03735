//! Celcat client facade.
//!
//! [`CelcatClient`] wires a [`ScraperConfig`] into one rate limiter, one
//! admission gate and one executor, and applies the configured filters to
//! decoded events.

use std::sync::Arc;

use celcat_core::{EventFilter, EventRecord};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::api::{get_calendar_raw_data, get_side_bar_event_raw_data};
use crate::config::ScraperConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::executor::RequestExecutor;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Client for one Celcat instance.
#[derive(Debug)]
pub struct CelcatClient<T = ReqwestTransport> {
    config: ScraperConfig,
    base_url: String,
    executor: RequestExecutor<T>,
    filter: EventFilter,
}

impl CelcatClient<ReqwestTransport> {
    /// Creates a client talking to the network through reqwest.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: ScraperConfig) -> ProviderResult<Self> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: HttpTransport> CelcatClient<T> {
    /// Creates a client using `transport`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the configuration is invalid.
    pub fn with_transport(config: ScraperConfig, transport: T) -> ProviderResult<Self> {
        config.validate()?;
        let base_url = config.base_url()?;

        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval()));
        let executor = RequestExecutor::new(transport, rate_limiter)
            .with_max_concurrency(config.max_concurrency)
            .with_timeout(config.timeout())
            .with_retry_policy(RetryPolicy::new(config.max_retries));
        let filter = EventFilter::new(config.filter.clone());

        debug!(
            url = %base_url,
            rate_limit = config.rate_limit,
            max_concurrency = config.max_concurrency,
            "created celcat client"
        );

        Ok(Self {
            config,
            base_url,
            executor,
            filter,
        })
    }

    /// Returns the configuration the client was built from.
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Returns the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    /// Fetches the raw calendar events of `federation_ids`.
    pub async fn calendar_raw_data(
        &self,
        federation_ids: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<Value>> {
        get_calendar_raw_data(&self.executor, &self.base_url, federation_ids, start, end).await
    }

    /// Fetches the details of one event.
    pub async fn side_bar_event(&self, event_id: &str) -> ProviderResult<Value> {
        get_side_bar_event_raw_data(&self.executor, &self.base_url, event_id).await
    }

    /// Fetches the calendar, decodes every event and applies the configured
    /// filters.
    ///
    /// # Errors
    ///
    /// Any request error, or `InvalidResponse` if an event has a known field
    /// of the wrong type.
    pub async fn calendar_events(
        &self,
        federation_ids: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<EventRecord>> {
        let raw = self.calendar_raw_data(federation_ids, start, end).await?;
        let mut events = raw
            .into_iter()
            .map(|value| {
                EventRecord::from_json(value).map_err(|e| {
                    ProviderError::invalid_response(format!("malformed event: {}", e))
                        .with_source(e)
                })
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        self.filter_events(&mut events);
        Ok(events)
    }

    /// Applies the configured filters in place.
    pub fn filter_events(&self, events: &mut [EventRecord]) {
        self.filter.filter_events(events);
    }
}
