//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::constants::request_body_limit;
use crate::error::HttpAppError;
use crate::handlers;
use crate::middleware::{cors_middleware, request_id_middleware, CorsConfig};
use crate::state::AppState;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::Uri,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use stowage_core::{AppError, Config};
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors_config = Arc::new(setup_cors(config));

    let body_limit = request_body_limit(state.gateway.settings().max_upload_bytes);
    let timeout = Duration::from_secs(config.request_timeout_secs());
    tracing::info!(
        body_limit_bytes = body_limit,
        timeout_secs = timeout.as_secs(),
        "Request limits configured"
    );

    let app = Router::new()
        .route(
            "/",
            post(handlers::upload::upload_object).options(handlers::upload::preflight),
        )
        .route("/health", get(handlers::health::health))
        .route("/objects/{*key}", get(handlers::objects::get_object))
        .route("/openapi.json", get(openapi_spec))
        .method_not_allowed_fallback(handlers::upload::method_not_allowed)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    handle_middleware_error(err, timeout)
                }))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            cors_config,
            cors_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> CorsConfig {
    let origins = config.cors_origins().to_vec();
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins");
    }
    CorsConfig::new(origins)
}

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Render errors raised by tower middleware in the JSON error envelope.
fn handle_middleware_error(err: BoxError, timeout: Duration) -> HttpAppError {
    if err.is::<Elapsed>() {
        HttpAppError(AppError::RequestTimeout(timeout.as_secs()))
    } else {
        HttpAppError(AppError::Internal(format!("Unhandled middleware error: {}", err)))
    }
}

async fn route_not_found(uri: Uri) -> HttpAppError {
    HttpAppError(AppError::NotFound(format!("No route for {}", uri.path())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::ErrorMetadata;

    #[test]
    fn elapsed_renders_as_request_timeout() {
        let HttpAppError(err) =
            handle_middleware_error(Box::new(Elapsed::new()), Duration::from_secs(30));
        assert!(matches!(err, AppError::RequestTimeout(30)));
        assert_eq!(err.http_status_code(), 408);
        assert!(err.client_message().contains("30 seconds"));
    }

    #[test]
    fn other_middleware_errors_are_internal() {
        let HttpAppError(err) =
            handle_middleware_error("boom".into(), Duration::from_secs(30));
        assert_eq!(err.http_status_code(), 500);
    }
}
