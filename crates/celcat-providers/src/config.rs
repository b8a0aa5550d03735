//! Scraper configuration.
//!
//! Settings can be built in code or read from a TOML file:
//!
//! ```toml
//! url = "https://services-web.example.edu/calendar"
//! rate_limit = 0.5
//! max_concurrency = 5
//!
//! [filter]
//! course_group_similar = true
//! rooms_strip_after_number = true
//! ```

use std::path::Path;
use std::time::Duration;

use celcat_core::FilterConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Attempts per logical request before giving up on transport errors.
pub const MAX_RETRIES: u32 = 3;

/// Simultaneous in-flight requests.
pub const CONCURRENT_REQUESTS: usize = 5;

/// Per-attempt request timeout, in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Minimum spacing between requests, in seconds.
pub const DEFAULT_RATE_LIMIT_SECS: f64 = 0.5;

/// Cap on the delay between retry attempts, in seconds.
pub const MAX_BACKOFF_DELAY_SECS: u64 = 10;

/// `Retry-After` assumed when a 429 response does not carry a usable one.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Characters of an error body kept in failure messages.
pub const ERROR_BODY_LIMIT: usize = 200;

/// Idle connections kept open per host.
pub const CONNECTION_POOL_SIZE: usize = 100;

/// Seconds an idle pooled connection is kept, also used as TCP keep-alive.
pub const CONNECTION_KEEP_ALIVE_SECS: u64 = 120;

/// Configuration for a [`CelcatClient`](crate::CelcatClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Base URL of the Celcat instance.
    pub url: String,
    /// Minimum seconds between two requests.
    pub rate_limit: f64,
    /// Maximum simultaneous requests.
    pub max_concurrency: usize,
    /// Per-attempt timeout in seconds; fractions are kept.
    pub timeout_secs: f64,
    /// Attempts per request on transport errors.
    pub max_retries: u32,
    /// Whether holidays are kept in fetched calendars.
    pub include_holidays: bool,
    /// Event filter settings.
    pub filter: FilterConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            rate_limit: DEFAULT_RATE_LIMIT_SECS,
            max_concurrency: CONCURRENT_REQUESTS,
            timeout_secs: TIMEOUT_SECS as f64,
            max_retries: MAX_RETRIES,
            include_holidays: true,
            filter: FilterConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(content: &str) -> ProviderResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse config: {}", e)).with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load_from(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_toml_str(&content)
    }

    /// Builder: set the minimum seconds between requests.
    pub fn with_rate_limit(mut self, seconds: f64) -> Self {
        self.rate_limit = seconds;
        self
    }

    /// Builder: set the concurrency bound.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Builder: set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f64();
        self
    }

    /// Builder: set the attempt budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder: set the filter configuration.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Builder: set holiday inclusion.
    pub fn with_include_holidays(mut self, include: bool) -> Self {
        self.include_holidays = include;
        self
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> ProviderResult<()> {
        self.base_url()?;
        checked_secs("rate_limit", self.rate_limit)?;
        if checked_secs("timeout_secs", self.timeout_secs)?.is_zero() {
            return Err(ProviderError::configuration("timeout_secs must be positive"));
        }
        if self.max_concurrency == 0 {
            return Err(ProviderError::configuration("max_concurrency must be at least 1"));
        }
        if self.max_retries == 0 {
            return Err(ProviderError::configuration("max_retries must be at least 1"));
        }
        Ok(())
    }

    /// Returns the parsed base URL with any trailing slash removed.
    pub fn base_url(&self) -> ProviderResult<String> {
        let parsed = Url::parse(&self.url).map_err(|e| {
            ProviderError::configuration(format!("invalid url {:?}: {}", self.url, e)).with_source(e)
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }

    /// Returns the minimum interval between requests.
    pub fn min_interval(&self) -> Duration {
        saturating_secs(self.rate_limit)
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        saturating_secs(self.timeout_secs)
    }
}

/// Converts seconds to a `Duration`, rejecting negative, non-finite and
/// overflowing values.
fn checked_secs(name: &str, seconds: f64) -> ProviderResult<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProviderError::configuration(format!(
            "{name} must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        ProviderError::configuration(format!("{name} is out of range: {seconds}")).with_source(e)
    })
}

/// Converts seconds to a `Duration`: zero for negative or NaN input,
/// `Duration::MAX` when the value does not fit.
pub(crate) fn saturating_secs(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.rate_limit, 0.5);
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert!(config.include_holidays);
        assert!(config.filter.course_title);
    }

    #[test]
    fn builder_methods() {
        let config = ScraperConfig::new("https://celcat.example.edu/")
            .with_rate_limit(1.5)
            .with_max_concurrency(2)
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(5)
            .with_include_holidays(false)
            .with_filter(FilterConfig::disabled());

        assert_eq!(config.min_interval(), Duration::from_millis(1500));
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.timeout_secs, 10.0);
        assert_eq!(config.max_retries, 5);
        assert!(!config.include_holidays);
        assert!(!config.filter.course_title);
        assert_eq!(config.base_url().unwrap(), "https://celcat.example.edu");
    }

    #[test]
    fn parses_toml() {
        let config = ScraperConfig::from_toml_str(
            r#"
            url = "https://celcat.example.edu/calendar/"
            rate_limit = 1.0

            [filter]
            course_group_similar = true
            sites_title = false

            [filter.course_replacements]
            "Maths" = "Mathematics"
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit, 1.0);
        assert_eq!(config.max_concurrency, 5);
        assert!(config.filter.course_group_similar);
        assert!(!config.filter.sites_title);
        assert!(config.filter.course_title);
        assert_eq!(config.filter.course_replacements.len(), 1);
        assert_eq!(
            config.base_url().unwrap(),
            "https://celcat.example.edu/calendar"
        );
    }

    #[test]
    fn rejects_bad_values() {
        let err = ScraperConfig::from_toml_str(r#"url = "not a url""#).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        let err = ScraperConfig::new("ftp://celcat.example.edu").validate().unwrap_err();
        assert!(err.message().contains("scheme"));

        let err = ScraperConfig::new("https://celcat.example.edu")
            .with_max_concurrency(0)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("max_concurrency"));

        let err = ScraperConfig::new("https://celcat.example.edu")
            .with_rate_limit(-1.0)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("rate_limit"));
    }

    #[test]
    fn sub_second_timeouts_are_kept() {
        let config = ScraperConfig::new("https://celcat.example.edu")
            .with_timeout(Duration::from_millis(500));
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(500));

        let config = ScraperConfig::new("https://celcat.example.edu")
            .with_timeout(Duration::from_millis(1500));
        assert_eq!(config.timeout(), Duration::from_millis(1500));

        let config = ScraperConfig::from_toml_str(
            "url = \"https://celcat.example.edu\"\ntimeout_secs = 2.5\n",
        )
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(2500));

        let err = ScraperConfig::new("https://celcat.example.edu")
            .with_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("timeout_secs"));
    }

    #[test]
    fn oversized_durations_are_configuration_errors() {
        let err = ScraperConfig::from_toml_str(
            "url = \"https://celcat.example.edu\"\nrate_limit = 1e20\n",
        )
        .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert!(err.message().contains("rate_limit"));

        let err = ScraperConfig::from_toml_str(
            "url = \"https://celcat.example.edu\"\ntimeout_secs = 1e20\n",
        )
        .unwrap_err();
        assert!(err.message().contains("timeout_secs"));
    }

    #[test]
    fn saturating_conversion() {
        assert_eq!(saturating_secs(-1.0), Duration::ZERO);
        assert_eq!(saturating_secs(f64::NAN), Duration::ZERO);
        assert_eq!(saturating_secs(0.25), Duration::from_millis(250));
        assert_eq!(saturating_secs(1e20), Duration::MAX);
        assert_eq!(saturating_secs(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("celcat.toml");
        std::fs::write(&path, "url = \"https://celcat.example.edu\"\nmax_retries = 2\n").unwrap();

        let config = ScraperConfig::load_from(&path).unwrap();
        assert_eq!(config.max_retries, 2);

        let missing = ScraperConfig::load_from(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(missing.code(), ProviderErrorCode::ConfigurationError);
    }
}
