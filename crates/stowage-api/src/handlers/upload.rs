use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use stowage_core::{AppError, UploadResponse};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// JSON form of an upload. The same fields may be sent as `multipart/form-data`,
/// with `path` as a JSON-encoded text field and the content in a `file` part.
#[allow(dead_code)] // Documentation only; the body is parsed by the gateway
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadJsonBody {
    /// Logical path segments; the last one is the file name
    #[schema(example = json!(["test", "hello.txt"]))]
    pub path: Vec<String>,
    /// Base64-encoded file content (alias: `file`)
    #[schema(example = "SGVsbG8gV29ybGQ=")]
    pub file_data: String,
    /// Defaults to `application/octet-stream`
    pub mime_type: Option<String>,
    /// Stored as metadata only
    pub file_name: Option<String>,
}

/// Upload a file
///
/// Writes the payload to `join(path, "/")` in the configured bucket, makes it
/// publicly readable and returns its public URL.
///
/// # Errors
/// - `AppError::UnsupportedMediaType` - Content type is neither JSON nor multipart
/// - `AppError::InvalidPath` - Empty path or a segment that is empty or not allowed
/// - `AppError::MalformedPayload` - Bad JSON, bad base64, missing or empty file
/// - `AppError::PayloadTooLarge` - File exceeds the configured bound
/// - `AppError::NotFound` - The bucket does not exist
/// - `AppError::PermissionDenied` - The store refused the write or ACL change
/// - `AppError::PublishFailed` - Stored but could not be made public
#[utoipa::path(
    post,
    path = "/",
    tag = "uploads",
    request_body(content = UploadJsonBody, content_type = "application/json"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Bucket not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "upload_object"))]
pub async fn upload_object(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let response = state.gateway.handle(request).await?;
    Ok(Json(response))
}

/// CORS preflight
///
/// The CORS headers themselves are added by the CORS middleware.
#[utoipa::path(
    options,
    path = "/",
    tag = "uploads",
    responses((status = 204, description = "Preflight accepted"))
)]
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for verbs a route does not serve.
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    HttpAppError(AppError::MethodNotAllowed(format!(
        "Method {} is not allowed",
        method
    )))
}
