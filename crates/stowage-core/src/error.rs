//! Error types module
//!
//! Every failure the gateway can surface is a variant of `AppError`. Each variant
//! self-describes its HTTP presentation through the `ErrorMetadata` trait, so the
//! HTTP layer only has to render what the error reports about itself.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for conditions an operator may need to act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_PATH")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the caller
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Request timed out after {0} seconds")]
    RequestTimeout(u64),

    /// The object was committed but could not be made public. No rollback is attempted.
    #[error("Object '{key}' stored but not made public: {cause}")]
    PublishFailed {
        key: String,
        #[source]
        cause: Box<AppError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<crate::validation::PathError> for AppError {
    fn from(err: crate::validation::PathError) -> Self {
        AppError::InvalidPath(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
/// `PublishFailed` is resolved through its cause before reaching this table.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::MethodNotAllowed(_) => (405, "METHOD_NOT_ALLOWED", false, LogLevel::Debug),
        // Reported as 400 to match the gateway's historical behavior for unknown content types.
        AppError::UnsupportedMediaType(_) => {
            (400, "UNSUPPORTED_MEDIA_TYPE", false, LogLevel::Debug)
        }
        AppError::InvalidPath(_) => (400, "INVALID_PATH", false, LogLevel::Debug),
        AppError::MalformedPayload(_) => (400, "MALFORMED_PAYLOAD", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Warn),
        AppError::PermissionDenied(_) => (403, "PERMISSION_DENIED", false, LogLevel::Warn),
        AppError::StoreUnavailable(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::RequestTimeout(_) => (408, "REQUEST_TIMEOUT", false, LogLevel::Warn),
        AppError::PublishFailed { cause, .. } => {
            let (status, _, sensitive, _) = app_error_static_metadata(cause);
            (status, "PUBLISH_FAILED", sensitive, LogLevel::Error)
        }
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MethodNotAllowed(_) => "MethodNotAllowed",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::InvalidPath(_) => "InvalidPath",
            AppError::MalformedPayload(_) => "MalformedPayload",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::PermissionDenied(_) => "PermissionDenied",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::RequestTimeout(_) => "RequestTimeout",
            AppError::PublishFailed { .. } => "PublishFailed",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MethodNotAllowed(ref msg) => msg.clone(),
            AppError::UnsupportedMediaType(ref msg) => msg.clone(),
            AppError::InvalidPath(ref msg) => msg.clone(),
            AppError::MalformedPayload(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PermissionDenied(ref msg) => msg.clone(),
            AppError::StoreUnavailable(_) => "Failed to access storage".to_string(),
            AppError::RequestTimeout(secs) => {
                format!("Request did not complete within {} seconds", secs)
            }
            AppError::PublishFailed { key, cause } => format!(
                "File was stored at '{}' but could not be made public: {}",
                key,
                cause.client_message()
            ),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_invalid_path() {
        let err = AppError::InvalidPath("path must be a non-empty array of strings".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_PATH");
        assert!(err.client_message().contains("non-empty array"));
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_store_unavailable_is_hidden() {
        let err = AppError::StoreUnavailable("connection reset by 10.0.0.12:9000".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert_eq!(err.client_message(), "Failed to access storage");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::MethodNotAllowed("GET".into()), 405),
            (AppError::UnsupportedMediaType("text/xml".into()), 400),
            (AppError::MalformedPayload("bad".into()), 400),
            (AppError::PayloadTooLarge("big".into()), 413),
            (AppError::NotFound("Bucket 'b' not found".into()), 404),
            (AppError::PermissionDenied("denied".into()), 403),
            (AppError::RequestTimeout(300), 408),
            (AppError::Internal("boom".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.http_status_code(), status, "{}", err.error_type());
        }
    }

    #[test]
    fn test_publish_failed_follows_cause() {
        let err = AppError::PublishFailed {
            key: "a/b.txt".to_string(),
            cause: Box::new(AppError::PermissionDenied("acl rejected".to_string())),
        };
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "PUBLISH_FAILED");
        assert!(err.client_message().contains("a/b.txt"));
        assert!(err.client_message().contains("acl rejected"));
        assert!(err.detailed_message().contains("Caused by"));
    }

    #[test]
    fn test_publish_failed_hides_backend_cause() {
        let err = AppError::PublishFailed {
            key: "a/b.txt".to_string(),
            cause: Box::new(AppError::StoreUnavailable("dns failure".to_string())),
        };
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("dns failure"));
    }
}
