//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<AppError>`) for errors and `?`
//! so they become `HttpAppError` and render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stowage_core::{AppError, ErrorMetadata, LogLevel, PathError};
use stowage_storage::StorageError;
use utoipa::ToSchema;

/// Error envelope returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from stowage-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<PathError> for HttpAppError {
    fn from(err: PathError) -> Self {
        HttpAppError(err.into())
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl HttpAppError {
    /// Build the JSON body, hiding details for sensitive errors or in production.
    fn to_body(&self, is_production: bool) -> ErrorResponse {
        let app_error = &self.0;
        let details = if is_production || app_error.is_sensitive() {
            None
        } else {
            Some(app_error.detailed_message())
        };

        ErrorResponse {
            success: false,
            error: app_error.client_message(),
            details,
            code: app_error.error_code().to_string(),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.0);

        let body = self.to_body(is_production_env());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_bucket_not_found() {
        let HttpAppError(app_err) = StorageError::BucketNotFound("uploads".to_string()).into();
        match app_err {
            AppError::NotFound(msg) => assert!(msg.contains("uploads")),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_invalid_key() {
        let HttpAppError(app_err) = StorageError::InvalidKey("Invalid key".to_string()).into();
        match app_err {
            AppError::InvalidPath(msg) => assert_eq!(msg, "Invalid key"),
            _ => panic!("Expected InvalidPath variant"),
        }
    }

    #[test]
    fn test_from_path_error() {
        let HttpAppError(app_err) = PathError::Empty.into();
        assert_eq!(app_err.http_status_code(), 400);
        assert!(app_err.client_message().contains("non-empty array"));
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let err = HttpAppError(AppError::StoreUnavailable("socket closed".to_string()));
        let body = err.to_body(false);
        assert!(body.details.is_none());
        assert!(!body.error.contains("socket"));
        assert_eq!(body.code, "STORAGE_ERROR");
    }

    #[test]
    fn test_production_hides_details() {
        let err = HttpAppError(AppError::InvalidPath("segment 1 is empty".to_string()));
        assert!(err.to_body(false).details.is_some());
        assert!(err.to_body(true).details.is_none());
    }

    /// The public error contract: `success: false`, `error`, `code`, optional `details`.
    #[test]
    fn test_error_response_shape() {
        let err = HttpAppError(AppError::MalformedPayload("bad base64".to_string()));
        let json = serde_json::to_value(err.to_body(false)).expect("serialize");
        assert_eq!(json.get("success").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(json.get("error").and_then(|v| v.as_str()), Some("bad base64"));
        assert_eq!(json.get("code").and_then(|v| v.as_str()), Some("MALFORMED_PAYLOAD"));
        assert!(json.get("details").is_some());
    }
}
