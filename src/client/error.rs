//! Errors returned by the commercetools client.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// One entry of the `errors` array of a commercetools error response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorObject {
    /// Machine-readable code, e.g. `ConcurrentModification`.
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Body of a non-2xx commercetools response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
}

/// Errors from talking to the commercetools API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("API error {status}: {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Top-level error message.
        message: String,
        /// Individual errors reported by the API.
        errors: Vec<ErrorObject>,
    },

    /// No access token could be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A retried operation kept failing until its deadline.
    #[error("Timed out after {timeout:?}: {source}")]
    Timeout {
        /// How long the operation was retried.
        timeout: Duration,
        /// The last error seen.
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// The HTTP status of an error response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Timeout { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the API reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether any entry of the response carries the given error code.
    pub fn has_error_code(&self, code: &str) -> bool {
        match self {
            Self::Response { errors, .. } => errors.iter().any(|e| e.code == code),
            _ => false,
        }
    }

    /// Whether the failure is transient and the request may be sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Response { status, .. } => {
                *status >= 500
                    || *status == 429
                    || (*status == 409 && self.has_error_code("ConcurrentModification"))
            }
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Auth(_) | Self::Decode(_) | Self::Timeout { .. } => false,
        }
    }

    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => Self::Response {
                status,
                message: parsed.message,
                errors: parsed.errors,
            },
            Err(_) => Self::Response {
                status,
                message: body.chars().take(500).collect(),
                errors: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_parses_error_response() {
        let body = r#"{
            "statusCode": 409,
            "message": "Object 1 has a different version than expected.",
            "errors": [{
                "code": "ConcurrentModification",
                "message": "different version",
                "currentVersion": 3
            }]
        }"#;
        let err = ApiError::from_body(409, body);

        assert_eq!(err.status(), Some(409));
        assert!(err.has_error_code("ConcurrentModification"));
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "API error 409: Object 1 has a different version than expected."
        );
    }

    #[test]
    fn test_from_body_falls_back_to_raw_text() {
        let err = ApiError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error 502: Bad Gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classification() {
        let not_found = ApiError::from_body(404, r#"{"message": "not found", "errors": []}"#);
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        let duplicate = ApiError::from_body(
            400,
            r#"{"message": "duplicate", "errors": [{"code": "DuplicateField"}]}"#,
        );
        assert!(!duplicate.is_retryable());

        let conflict = ApiError::from_body(409, r#"{"message": "x", "errors": []}"#);
        assert!(!conflict.is_retryable());

        assert!(ApiError::from_body(429, "slow down").is_retryable());
        assert!(!ApiError::Auth("denied".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_keeps_source_status() {
        let err = ApiError::Timeout {
            timeout: Duration::from_secs(20),
            source: Box::new(ApiError::from_body(503, "unavailable")),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("Timed out after 20s"));
    }
}
