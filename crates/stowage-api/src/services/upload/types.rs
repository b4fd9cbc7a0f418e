//! Types used by the upload gateway

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use std::fmt;
use stowage_core::{AppError, Config, PathPolicy};

/// Upload limits and metadata defaults, taken from configuration once at startup.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_upload_bytes: usize,
    pub path_policy: PathPolicy,
    pub uploaded_by: String,
}

impl UploadSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_size_bytes(),
            path_policy: config.path_policy(),
            uploaded_by: config.uploaded_by().to_string(),
        }
    }
}

/// Progress of a single upload through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    ContentTypeDispatched,
    Validated,
    Decoded,
    Stored,
    Published,
    Responded,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Received => "received",
            UploadStage::ContentTypeDispatched => "content_type_dispatched",
            UploadStage::Validated => "validated",
            UploadStage::Decoded => "decoded",
            UploadStage::Stored => "stored",
            UploadStage::Published => "published",
            UploadStage::Responded => "responded",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File content as carried by the transport, before decoding.
#[derive(Debug, Clone)]
pub enum EncodedPayload {
    /// Base64 text from a JSON envelope
    Base64(String),
    /// Raw bytes from a multipart file part, already bounded while reading
    Raw(Bytes),
}

impl EncodedPayload {
    /// Decode into raw bytes, enforcing `max_bytes`. Empty output is rejected.
    pub fn decode(self, max_bytes: usize) -> Result<Bytes, AppError> {
        let bytes = match self {
            EncodedPayload::Raw(bytes) => bytes,
            EncodedPayload::Base64(text) => {
                let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                // Decoded length is at most 3/4 of the encoded length.
                if compact.len() / 4 * 3 > max_bytes.saturating_add(2) {
                    return Err(too_large(max_bytes));
                }
                let decoded = STANDARD.decode(compact.as_bytes()).map_err(|e| {
                    AppError::MalformedPayload(format!("fileData is not valid base64: {}", e))
                })?;
                Bytes::from(decoded)
            }
        };

        if bytes.is_empty() {
            return Err(AppError::MalformedPayload(
                "File content must not be empty".to_string(),
            ));
        }
        if bytes.len() > max_bytes {
            return Err(too_large(max_bytes));
        }

        Ok(bytes)
    }
}

pub(crate) fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File size exceeds maximum allowed size of {} bytes",
        max_bytes
    ))
}

/// Transport-independent result of parsing an upload request.
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    /// Raw, unvalidated path segments
    pub path: Vec<String>,
    pub payload: EncodedPayload,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64() {
        let bytes = EncodedPayload::Base64("SGVsbG8gV29ybGQ=".to_string())
            .decode(1024)
            .unwrap();
        assert_eq!(bytes.as_ref(), b"Hello World");
    }

    #[test]
    fn tolerates_line_breaks_in_base64() {
        let bytes = EncodedPayload::Base64("SGVsbG8g\nV29ybGQ=\n".to_string())
            .decode(1024)
            .unwrap();
        assert_eq!(bytes.as_ref(), b"Hello World");
    }

    #[test]
    fn rejects_malformed_base64() {
        let err = EncodedPayload::Base64("not base64!!".to_string())
            .decode(1024)
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn rejects_empty_payloads() {
        for payload in [
            EncodedPayload::Base64(String::new()),
            EncodedPayload::Raw(Bytes::new()),
        ] {
            assert!(matches!(
                payload.decode(1024),
                Err(AppError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn enforces_size_bound() {
        let err = EncodedPayload::Raw(Bytes::from_static(b"0123456789"))
            .decode(4)
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        // "Hello World" is 11 bytes
        let err = EncodedPayload::Base64("SGVsbG8gV29ybGQ=".to_string())
            .decode(10)
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(UploadStage::ContentTypeDispatched.to_string(), "content_type_dispatched");
        assert_eq!(UploadStage::Responded.as_str(), "responded");
    }
}
