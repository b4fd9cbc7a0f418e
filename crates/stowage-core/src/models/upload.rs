use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::DEFAULT_MIME_TYPE;

/// A fully decoded upload, built once per HTTP call and consumed by the gateway.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Logical path; the last segment is the file name.
    pub path: Vec<String>,
    pub payload: Bytes,
    pub mime_type: String,
    /// Only recorded in metadata, never used to build the key.
    pub declared_file_name: Option<String>,
}

impl UploadRequest {
    pub fn new(
        path: Vec<String>,
        payload: Bytes,
        mime_type: Option<String>,
        declared_file_name: Option<String>,
    ) -> Self {
        let mime_type = mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let declared_file_name = declared_file_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Self {
            path,
            payload,
            mime_type,
            declared_file_name,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Payload of a successful upload response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    /// Bucket the object was written to
    pub bucket: String,
    /// Resolved object key (`/`-joined path)
    pub file_path: String,
    /// Unauthenticated read URL
    pub public_url: String,
    /// Size in bytes
    pub size: usize,
    pub mime_type: String,
}

/// Success envelope returned by `POST /`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: UploadData,
}

impl UploadResponse {
    pub fn new(data: UploadData) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully".to_string(),
            data,
        }
    }
}
