//! Public object route: serves objects that were made public.
//! Lets the local and in-memory backends resolve the URLs they issue.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use stowage_core::AppError;
use stowage_storage::StorageError;

/// Read a public object. Private and missing objects are both reported as 404.
#[utoipa::path(
    get,
    path = "/objects/{key}",
    tag = "objects",
    params(("key" = String, Path, description = "Object key, e.g. test/hello.txt")),
    responses(
        (status = 200, description = "Object content"),
        (status = 404, description = "Object not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_object"))]
pub async fn get_object(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let not_found = || HttpAppError(AppError::NotFound(format!("Object '{}' not found", key)));

    let object = match state.storage.get(&key).await {
        Ok(object) => object,
        Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
            return Err(not_found())
        }
        Err(e) => return Err(e.into()),
    };

    if !object.public {
        tracing::debug!(key = %key, "Refusing to serve private object");
        return Err(not_found());
    }

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type.as_str())
        .header(header::CONTENT_LENGTH, object.size())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(object.bytes))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
