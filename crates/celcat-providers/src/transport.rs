//! HTTP transport seam.
//!
//! The request executor talks to the network through [`HttpTransport`], so
//! the retry and classification logic can be driven by a scripted transport
//! in tests. [`ReqwestTransport`] is the production implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use tracing::trace;

use crate::config::{CONNECTION_KEEP_ALIVE_SECS, CONNECTION_POOL_SIZE};
use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-request options supplied by the caller.
///
/// Unset values are filled from the executor's defaults; values set here win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Whether to ask for a compressed response.
    pub compress: Option<bool>,
    /// URL-encoded form body fields, in order.
    pub form: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder: set compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }

    /// Builder: add a form field.
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Builder: add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Fills unset values with the defaults: the given timeout and
    /// compression enabled.
    pub fn merged_over_defaults(mut self, timeout: Duration) -> Self {
        self.timeout.get_or_insert(timeout);
        self.compress.get_or_insert(true);
        self
    }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Options, already merged over defaults.
    pub options: RequestOptions,
}

impl HttpRequest {
    /// Creates a request.
    pub fn new(method: Method, url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            url: url.into(),
            options,
        }
    }
}

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes, already decompressed.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Builder: set the `Content-Type` header.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    /// Builder: set an arbitrary header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a header value as text, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header, or an empty string.
    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE.as_str()).unwrap_or_default()
    }

    /// Returns true if the response declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type().contains("application/json")
    }

    /// Decodes the body as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as Latin-1, which never fails.
    pub fn text_latin1(&self) -> String {
        self.body.iter().map(|&b| char::from(b)).collect()
    }

    /// Decodes the body as JSON.
    pub fn json(&self) -> ProviderResult<serde_json::Value> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_source(e)
        })
    }
}

/// Sends a single HTTP request.
///
/// Implementations must report connection-level problems (refused, DNS,
/// reset, timeout) as [`ProviderErrorCode::TransportFailed`] and return any
/// response that was received, whatever its status.
///
/// [`ProviderErrorCode::TransportFailed`]: crate::error::ProviderErrorCode::TransportFailed
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and buffers the response.
    fn send<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, ProviderResult<HttpResponse>>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with gzip, deflate and brotli decoding enabled and
    /// a pool of up to 100 idle connections per host kept for 120 seconds.
    pub fn new() -> ProviderResult<Self> {
        let keep_alive = Duration::from_secs(CONNECTION_KEEP_ALIVE_SECS);
        let client = Client::builder()
            .user_agent(format!("celcat-providers/{}", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(CONNECTION_POOL_SIZE)
            .pool_idle_timeout(keep_alive)
            .tcp_keepalive(keep_alive)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, ProviderResult<HttpResponse>> {
        Box::pin(async move {
            let options = &request.options;
            let mut builder = self.client.request(request.method.clone(), &request.url);

            if let Some(timeout) = options.timeout {
                builder = builder.timeout(timeout);
            }
            if options.compress == Some(false) {
                builder = builder.header(ACCEPT_ENCODING, "identity");
            }
            for (name, value) in &options.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !options.form.is_empty() {
                builder = builder.form(&options.form);
            }

            trace!(method = %request.method, url = %request.url, "sending request");

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(transport_error)?;

            trace!(status = %status, bytes = body.len(), "received response");

            Ok(HttpResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        })
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_builder() {
        return ProviderError::invalid_input(format!("invalid request: {}", e)).with_source(e);
    }
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::transport(message).with_source(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::RETRY_AFTER;

    #[test]
    fn caller_options_win() {
        let options = RequestOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_compress(false)
            .merged_over_defaults(Duration::from_secs(30));

        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.compress, Some(false));
    }

    #[test]
    fn defaults_fill_gaps() {
        let options = RequestOptions::new()
            .with_form_field("eventid", "42")
            .merged_over_defaults(Duration::from_secs(30));

        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.compress, Some(true));
        assert_eq!(options.form, vec![("eventid".to_string(), "42".to_string())]);
    }

    #[test]
    fn response_content_type() {
        let response = HttpResponse::new(StatusCode::OK, "[]")
            .with_content_type("application/json; charset=utf-8");
        assert!(response.is_json());
        assert_eq!(response.json().unwrap(), serde_json::json!([]));

        let html = HttpResponse::new(StatusCode::OK, "<html>");
        assert!(!html.is_json());
        assert_eq!(html.content_type(), "");
    }

    #[test]
    fn latin1_never_fails() {
        let response = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, vec![0x45, 0xe9, 0x74]);
        assert_eq!(response.text_latin1(), "Eét");
        assert_eq!(response.text(), "E\u{fffd}t");
    }

    #[test]
    fn invalid_json_is_invalid_response() {
        let response = HttpResponse::new(StatusCode::OK, "{not json");
        let err = response.json().unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::InvalidResponse);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
            .with_header(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(response.header("Retry-After"), Some("12"));
    }

    #[test]
    fn header_names_built_at_runtime() {
        let name = HeaderName::from_bytes(b"X-Celcat-Session").unwrap();
        let value = HeaderValue::from_str("abc123").unwrap();
        let response = HttpResponse::new(StatusCode::OK, "").with_header(name, value);
        assert_eq!(response.header("x-celcat-session"), Some("abc123"));
    }

    #[test]
    fn reqwest_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn connection_pool_sizing() {
        assert_eq!(CONNECTION_POOL_SIZE, 100);
        assert_eq!(CONNECTION_KEEP_ALIVE_SECS, 120);
        let transport = ReqwestTransport::new().unwrap();
        assert!(transport.client.get("https://celcat.example.edu").build().is_ok());
    }
}
