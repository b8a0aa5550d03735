//! Resilient request layer and Celcat endpoint access.
//!
//! - [`RateLimiter`] - Spaces requests out, with an adaptive backoff multiplier
//! - [`RequestExecutor`] - Rate-limited, concurrency-bounded, retrying HTTP calls
//! - [`classify`] / [`validate_response`] - Map HTTP responses to payloads or errors
//! - [`CelcatClient`] - Wires a [`ScraperConfig`] into all of the above
//!
//! # Architecture
//!
//! ```text
//!   CelcatClient ── api::get_calendar_raw_data / get_side_bar_event_raw_data
//!        │
//!        ▼
//!   RequestExecutor ── with_retry(RetryPolicy)
//!        │   per attempt:
//!        │     RateLimiter::acquire ─► admission permit ─► HttpTransport::send
//!        ▼
//!   classify (non-200) / decode_success (200) ─► Payload
//! ```
//!
//! # Example
//!
//! ```ignore
//! use celcat_providers::{CelcatClient, ScraperConfig};
//!
//! let client = CelcatClient::new(ScraperConfig::load_from("celcat.toml")?)?;
//! let events = client.calendar_events("GRP-1", start, end).await?;
//! ```

pub mod api;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use api::{get_calendar_raw_data, get_side_bar_event_raw_data};
pub use classify::{Expected, Payload, classify, validate_response};
pub use client::CelcatClient;
pub use config::ScraperConfig;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use executor::RequestExecutor;
pub use rate_limit::RateLimiter;
pub use retry::{RetryPolicy, with_retry};
pub use transport::{BoxFuture, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestOptions};
