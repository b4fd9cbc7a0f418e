//! Shared constants

/// MIME type used when the client does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Default bound on a single uploaded payload (100 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 100;

/// Default value of the `uploaded_by` metadata tag.
pub const DEFAULT_UPLOADED_BY: &str = "stowage-gateway";

/// Metadata attribute names, shared by every backend so stored objects read back the same.
pub const META_ORIGINAL_FILE_NAME: &str = "original-file-name";
pub const META_UPLOADED_AT: &str = "uploaded-at";
pub const META_UPLOADED_BY: &str = "uploaded-by";
