//! OpenAPI documentation, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use stowage_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stowage API",
        version = "0.1.0",
        description = "Object ingestion gateway. Accepts a file as JSON with a base64 payload or as multipart/form-data, stores it under a hierarchical path in a single bucket and returns its public URL."
    ),
    paths(
        handlers::upload::upload_object,
        handlers::upload::preflight,
        handlers::objects::get_object,
        handlers::health::health,
    ),
    components(schemas(
        models::UploadResponse,
        models::UploadData,
        handlers::upload::UploadJsonBody,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "File ingestion"),
        (name = "objects", description = "Public object reads"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
