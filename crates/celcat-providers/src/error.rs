//! Error types for Celcat request operations.
//!
//! Every failure raised by the request layer is a [`ProviderError`] labeled
//! with a [`ProviderErrorCode`]. Only transport failures are retried
//! internally; everything else reaches the caller as-is.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Server answered 401 or 403.
    AuthenticationFailed,
    /// Server answered 429; see [`ProviderError::retry_after`].
    RateLimited,
    /// Server unreachable or answered with an unusable response: a non-200
    /// status, an unexpected content type, or exhausted transport retries.
    ConnectionFailed,
    /// Connection refused, DNS failure, reset or timeout before a response.
    TransportFailed,
    /// The body could not be decoded into the expected shape.
    InvalidResponse,
    /// The caller passed invalid arguments.
    InvalidInput,
    /// Configuration is missing or invalid.
    ConfigurationError,
}

impl ProviderErrorCode {
    /// Returns true if the request loop may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailed)
    }

    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::RateLimited => "rate_limited",
            Self::ConnectionFailed => "connection_failed",
            Self::TransportFailed => "transport_failed",
            Self::InvalidResponse => "invalid_response",
            Self::InvalidInput => "invalid_input",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a Celcat server.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Seconds the server asked us to wait (rate limiting only).
    retry_after: Option<u64>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a rate limit error carrying the server's `Retry-After` hint.
    pub fn rate_limited(retry_after: u64) -> Self {
        let mut err = Self::new(
            ProviderErrorCode::RateLimited,
            format!("Rate limited. Retry after {} seconds", retry_after),
        );
        err.retry_after = Some(retry_after);
        err
    }

    /// Creates a connectivity error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConnectionFailed, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TransportFailed, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidInput, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `Retry-After` hint in seconds, if the server sent one.
    pub fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
