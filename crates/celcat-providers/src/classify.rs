//! Response classification.
//!
//! Turns a received [`HttpResponse`] into either a decoded [`Payload`] or a
//! labeled [`ProviderError`].

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;

use crate::config::{DEFAULT_RETRY_AFTER_SECS, ERROR_BODY_LIMIT};
use crate::error::{ProviderError, ProviderResult};
use crate::transport::HttpResponse;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body served as `application/json`.
    Json(Value),
    /// Any other body, decoded as text.
    Text(String),
}

impl Payload {
    /// Returns the JSON value, or an error if the server sent text.
    pub fn into_json(self) -> ProviderResult<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => Err(ProviderError::connection(format!(
                "Expected JSON response but got: {}",
                truncate(&text, ERROR_BODY_LIMIT)
            ))),
        }
    }

    /// Returns the body as text; JSON is re-serialized.
    pub fn into_text(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

/// The body type a caller expects from [`validate_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A JSON document; the `Content-Type` must say so.
    Json,
    /// Anything, decoded as text.
    Text,
}

/// Maps a non-200 response to its failure.
///
/// - 401 and 403 are authentication failures,
/// - 429 is a rate limit failure carrying `Retry-After` (30s if unusable),
/// - anything else is a connectivity failure with the status and the first
///   200 characters of the body.
pub fn classify(response: &HttpResponse) -> ProviderError {
    match response.status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication("Authentication failed"),
        StatusCode::FORBIDDEN => ProviderError::authentication("Access forbidden"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(retry_after(response)),
        status => ProviderError::connection(format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate(&response.text(), ERROR_BODY_LIMIT)
        )),
    }
}

/// Decodes a 200 response: JSON when the `Content-Type` says so, text
/// otherwise.
pub fn decode_success(response: &HttpResponse) -> ProviderResult<Payload> {
    if response.is_json() {
        response.json().map(Payload::Json)
    } else {
        Ok(Payload::Text(response.text()))
    }
}

/// Validates a response against the expected body type.
///
/// A non-200 status is always a connectivity failure whose message carries
/// the body read as Latin-1, so non-UTF-8 error pages never cause a second
/// failure. When JSON is expected, a missing `application/json` content type
/// is a connectivity failure and the body is not parsed.
pub fn validate_response(response: &HttpResponse, expected: Expected) -> ProviderResult<Payload> {
    if response.status != StatusCode::OK {
        return Err(ProviderError::connection(format!(
            "Server returned status {}: {}",
            response.status.as_u16(),
            truncate(&response.text_latin1(), ERROR_BODY_LIMIT)
        )));
    }

    match expected {
        Expected::Json if !response.is_json() => Err(ProviderError::connection(
            "Expected JSON response but got different content type",
        )),
        Expected::Json => response.json().map(Payload::Json),
        Expected::Text => Ok(Payload::Text(response.text())),
    }
}

fn retry_after(response: &HttpResponse) -> u64 {
    response
        .header(RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use crate::error::ProviderErrorCode;
    use serde_json::json;

    #[test]
    fn unauthorized_and_forbidden() {
        let err = classify(&HttpResponse::new(StatusCode::UNAUTHORIZED, ""));
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "Authentication failed");

        let err = classify(&HttpResponse::new(StatusCode::FORBIDDEN, ""));
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "Access forbidden");
    }

    #[test]
    fn rate_limited_reads_retry_after() {
        let response = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
            .with_header(RETRY_AFTER, HeaderValue::from_static("12"));
        let err = classify(&response);
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert_eq!(err.retry_after(), Some(12));
    }

    #[test]
    fn rate_limited_defaults_retry_after() {
        let err = classify(&HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, ""));
        assert_eq!(err.retry_after(), Some(30));

        let response = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "").with_header(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(classify(&response).retry_after(), Some(30));
    }

    #[test]
    fn other_status_is_connectivity() {
        let body = "x".repeat(500);
        let err = classify(&HttpResponse::new(StatusCode::BAD_GATEWAY, body));
        assert_eq!(err.code(), ProviderErrorCode::ConnectionFailed);
        assert!(err.message().starts_with("HTTP 502: "));
        assert_eq!(err.message().len(), "HTTP 502: ".len() + 200);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé");
        assert_eq!(truncate("ab", 5), "ab");
    }

    #[test]
    fn decode_success_by_content_type() {
        let json_response = HttpResponse::new(StatusCode::OK, r#"{"a":1}"#)
            .with_content_type("application/json");
        assert_eq!(
            decode_success(&json_response).unwrap(),
            Payload::Json(json!({"a": 1}))
        );

        let text_response = HttpResponse::new(StatusCode::OK, r#"{"a":1}"#)
            .with_content_type("text/html");
        assert_eq!(
            decode_success(&text_response).unwrap(),
            Payload::Text(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn validate_rejects_non_200_with_latin1_body() {
        let response = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, vec![0x45, 0x72, 0xe9])
            .with_content_type("application/json");
        let err = validate_response(&response, Expected::Json).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConnectionFailed);
        assert_eq!(err.message(), "Server returned status 500: Eré");
    }

    #[test]
    fn validate_checks_content_type_before_parsing() {
        let response = HttpResponse::new(StatusCode::OK, "<html>login</html>")
            .with_content_type("text/html");
        let err = validate_response(&response, Expected::Json).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConnectionFailed);

        let text = validate_response(&response, Expected::Text).unwrap();
        assert_eq!(text, Payload::Text("<html>login</html>".to_string()));
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(Payload::Json(json!([1])).into_json().unwrap(), json!([1]));
        assert_eq!(Payload::Json(json!([1])).into_text(), "[1]");
        let err = Payload::Text("oops".into()).into_json().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConnectionFailed);
    }
}
