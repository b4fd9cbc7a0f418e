use axum::http::{header, HeaderMap, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::constants::{CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS};

/// CORS configuration
#[derive(Clone, Debug)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin
    pub origins: Vec<String>,
}

impl CorsConfig {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    fn allows_any(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }

    /// Origin to advertise for a request: `*`, the matching request origin, or the
    /// first configured origin.
    fn allow_origin(&self, request_origin: Option<&str>) -> Option<String> {
        if self.allows_any() {
            return Some("*".to_string());
        }
        request_origin
            .and_then(|origin| self.origins.iter().find(|o| o.as_str() == origin))
            .or_else(|| self.origins.first())
            .cloned()
    }
}

fn apply_headers(headers: &mut HeaderMap, allow_origin: Option<String>, vary_origin: bool) {
    if let Some(value) = allow_origin.and_then(|o| HeaderValue::from_str(&o).ok()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    if vary_origin {
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// CORS middleware
/// Adds the CORS headers to every response, errors and preflights included.
pub async fn cors_middleware(
    State(config): State<Arc<CorsConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let request_origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let mut response = next.run(request).await;

    let allow_origin = config.allow_origin(request_origin.as_deref());
    apply_headers(response.headers_mut(), allow_origin, !config.allows_any());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_any_origin() {
        let config = CorsConfig::new(vec!["*".to_string()]);
        assert_eq!(config.allow_origin(Some("https://a.example")).as_deref(), Some("*"));
        assert_eq!(config.allow_origin(None).as_deref(), Some("*"));
    }

    #[test]
    fn listed_origin_is_echoed() {
        let config = CorsConfig::new(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ]);
        assert_eq!(
            config.allow_origin(Some("https://b.example")).as_deref(),
            Some("https://b.example")
        );
        assert_eq!(
            config.allow_origin(Some("https://evil.example")).as_deref(),
            Some("https://a.example")
        );
    }

    #[test]
    fn headers_are_applied() {
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, Some("*".to_string()), false);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert!(headers.get(header::VARY).is_none());
    }
}
