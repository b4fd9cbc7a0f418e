//! API constants

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Methods advertised in CORS responses.
pub const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Request headers advertised in CORS responses.
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Slack added to the request body limit on top of the base64-inflated payload
/// bound, for the JSON envelope or multipart framing.
pub const BODY_LIMIT_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body limit for a given decoded payload bound.
///
/// Base64 inflates payloads by 4/3, so the body may legitimately exceed the bound.
pub fn request_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(4)
        .div_ceil(3)
        .saturating_add(BODY_LIMIT_OVERHEAD_BYTES)
}
