//! Provider error type and the diagnostics reported to the host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ApiError;

/// Errors returned by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A value in the configuration or state is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider is not configured, or configured incorrectly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource already exists (duplicate key).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Authentication or authorization failure.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The API is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The operation did not finish in time.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The remote object changed since it was read (version conflict).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// The API rejected the request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected response or internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// The error message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::AlreadyExists(msg)
            | Self::PermissionDenied(msg)
            | Self::ResourceExhausted(msg)
            | Self::Unavailable(msg)
            | Self::DeadlineExceeded(msg)
            | Self::FailedPrecondition(msg)
            | Self::InvalidRequest(msg)
            | Self::Internal(msg) => msg,
            Self::Serialization(_) => "serialization error (see Debug output)",
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        let msg = err.to_string();
        match &err {
            ApiError::Response { status, .. } => match *status {
                400 => Self::InvalidRequest(msg),
                401 | 403 => Self::PermissionDenied(msg),
                404 => Self::NotFound(msg),
                409 if err.has_error_code("DuplicateField") => Self::AlreadyExists(msg),
                409 => Self::FailedPrecondition(msg),
                429 => Self::ResourceExhausted(msg),
                500..=599 => Self::Unavailable(msg),
                _ => Self::Internal(msg),
            },
            ApiError::Http(_) => Self::Unavailable(msg),
            ApiError::Auth(_) => Self::PermissionDenied(msg),
            ApiError::Decode(_) => Self::Internal(msg),
            ApiError::Timeout { .. } => Self::DeadlineExceeded(msg),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            }
            ProviderError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Prevents the operation from completing.
    Error,
    /// Reported but not blocking.
    Warning,
}

/// A message shown to the user by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Dotted path of the attribute the issue is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Diagnostic::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, ErrorObject};

    fn response_error(status: u16, code: &str) -> ApiError {
        ApiError::Response {
            status,
            message: format!("{} happened", code),
            errors: vec![ErrorObject {
                code: code.to_string(),
                message: format!("{} happened", code),
            }],
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("product-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: product-123");

        let err = ProviderError::UnknownResource("commercetools_cart".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: commercetools_cart");
        assert_eq!(err.message(), "commercetools_cart");
    }

    #[test]
    fn test_api_error_mapping() {
        let err: ProviderError = response_error(404, "ResourceNotFound").into();
        assert!(matches!(err, ProviderError::NotFound(_)));

        let err: ProviderError = response_error(409, "ConcurrentModification").into();
        assert!(matches!(err, ProviderError::FailedPrecondition(_)));

        let err: ProviderError = response_error(400, "DuplicateField").into();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));

        let err: ProviderError = response_error(409, "DuplicateField").into();
        assert!(matches!(err, ProviderError::AlreadyExists(_)));

        let err: ProviderError = response_error(503, "ServiceUnavailable").into();
        assert!(matches!(err, ProviderError::Unavailable(_)));

        let err: ProviderError = response_error(403, "insufficient_scope").into();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));

        let err: ProviderError = ApiError::Auth("bad credentials".to_string()).into();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = ProviderError::NotFound("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status: tonic::Status = ProviderError::Configuration("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let status: tonic::Status = ProviderError::AlreadyExists("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::AlreadyExists);

        let status: tonic::Status = ProviderError::DeadlineExceeded("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);

        let status: tonic::Status = ProviderError::Internal("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Internal);
    }

    #[test]
    fn test_diagnostic_from_error() {
        let diag = Diagnostic::from(&ProviderError::Validation("bad key".to_string()));
        assert!(diag.is_error());
        assert_eq!(diag.summary, "Validation error: bad key");
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::warning("Deprecated attribute")
            .with_detail("Use slug instead")
            .with_attribute("name");

        assert!(!diag.is_error());
        assert_eq!(diag.detail.as_deref(), Some("Use slug instead"));
        assert_eq!(diag.attribute.as_deref(), Some("name"));
    }
}
