//! Upload gateway
//!
//! Drives one request through the pipeline:
//! received → content type dispatched → validated → decoded → stored → published → responded.
//! Any stage may fail; the failure is logged with the stage it happened in. Nothing
//! is retried and a failed publish does not roll back the stored object.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use stowage_core::{
    validate_path, AppError, ErrorMetadata, ObjectMetadata, StorageKey, UploadData,
    UploadRequest, UploadResponse,
};
use stowage_storage::Storage;

use super::source::PayloadSource;
use super::types::{UploadSettings, UploadStage};

/// Records stage transitions for one upload.
struct StageTracker {
    stage: UploadStage,
    started: Instant,
}

impl StageTracker {
    fn new() -> Self {
        tracing::debug!(stage = %UploadStage::Received, "Upload received");
        Self {
            stage: UploadStage::Received,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: UploadStage) {
        tracing::debug!(
            from = %self.stage,
            stage = %next,
            elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Upload stage transition"
        );
        self.stage = next;
    }

    fn fail(&self, error: &AppError) {
        tracing::warn!(
            stage = %self.stage,
            error = %error,
            error_code = error.error_code(),
            elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Upload failed"
        );
    }
}

/// Upload gateway
///
/// Owns no per-request state; one instance is shared by all handlers.
#[derive(Clone)]
pub struct UploadGateway {
    storage: Arc<dyn Storage>,
    settings: UploadSettings,
}

impl UploadGateway {
    pub fn new(storage: Arc<dyn Storage>, settings: UploadSettings) -> Self {
        Self { storage, settings }
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Handle a raw HTTP upload request end to end.
    pub async fn handle(&self, request: Request) -> Result<UploadResponse, AppError> {
        let mut tracker = StageTracker::new();
        match self.run(request, &mut tracker).await {
            Ok(response) => {
                tracker.advance(UploadStage::Responded);
                Ok(response)
            }
            Err(error) => {
                tracker.fail(&error);
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        request: Request,
        tracker: &mut StageTracker,
    ) -> Result<UploadResponse, AppError> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let source = PayloadSource::from_content_type(content_type.as_deref())?;
        tracker.advance(UploadStage::ContentTypeDispatched);

        let parsed = source
            .parse(request, self.settings.max_upload_bytes)
            .await?;

        let key = validate_path(parsed.path.as_slice(), self.settings.path_policy)?;
        tracker.advance(UploadStage::Validated);

        let payload = parsed.payload.decode(self.settings.max_upload_bytes)?;
        let upload = UploadRequest::new(
            key.segments().map(str::to_string).collect(),
            payload,
            parsed.mime_type,
            parsed.file_name,
        );
        tracker.advance(UploadStage::Decoded);

        self.store_and_publish(&key, upload, tracker).await
    }

    /// Store a decoded upload at `key`, make it public and build the response.
    async fn store_and_publish(
        &self,
        key: &StorageKey,
        upload: UploadRequest,
        tracker: &mut StageTracker,
    ) -> Result<UploadResponse, AppError> {
        let file_name = upload
            .declared_file_name
            .clone()
            .unwrap_or_else(|| key.file_name().to_string());
        let metadata = ObjectMetadata::new(file_name, self.settings.uploaded_by.clone());
        let size = upload.size();

        self.storage
            .put(key.as_str(), upload.payload, &upload.mime_type, &metadata)
            .await?;
        tracker.advance(UploadStage::Stored);

        if let Err(err) = self.storage.make_public(key.as_str()).await {
            return Err(AppError::PublishFailed {
                key: key.as_str().to_string(),
                cause: Box::new(err.into()),
            });
        }
        tracker.advance(UploadStage::Published);

        tracing::info!(
            bucket = %self.storage.bucket(),
            key = %key,
            size_bytes = size,
            mime_type = %upload.mime_type,
            "File uploaded"
        );

        Ok(UploadResponse::new(UploadData {
            bucket: self.storage.bucket().to_string(),
            file_path: key.as_str().to_string(),
            public_url: self.storage.public_url(key.as_str()),
            size,
            mime_type: upload.mime_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use stowage_core::PathPolicy;
    use stowage_storage::MemoryStorage;

    fn gateway() -> (UploadGateway, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new("uploads"));
        let gateway = UploadGateway::new(
            storage.clone(),
            UploadSettings {
                max_upload_bytes: 1024,
                path_policy: PathPolicy::Strict,
                uploaded_by: "unit-test".to_string(),
            },
        );
        (gateway, storage)
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn stores_and_publishes_json_upload() {
        let (gateway, storage) = gateway();
        let response = gateway
            .handle(json_request(
                r#"{"path":[" test ","hello.txt"],"fileData":"SGVsbG8gV29ybGQ=","mimeType":"text/plain"}"#,
            ))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.data.file_path, "test/hello.txt");
        assert_eq!(response.data.size, 11);
        assert_eq!(response.data.bucket, "uploads");
        assert_eq!(response.data.public_url, "memory://uploads/test/hello.txt");

        let object = storage.get("test/hello.txt").await.unwrap();
        assert_eq!(object.bytes.as_ref(), b"Hello World");
        assert!(object.public);
        let metadata = object.metadata.unwrap();
        assert_eq!(metadata.original_file_name, "hello.txt");
        assert_eq!(metadata.uploaded_by, "unit-test");
    }

    #[tokio::test]
    async fn declared_file_name_only_affects_metadata() {
        let (gateway, storage) = gateway();
        let response = gateway
            .handle(json_request(
                r#"{"path":["docs","a.bin"],"fileData":"AAEC","fileName":"original.bin"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.data.file_path, "docs/a.bin");
        assert_eq!(response.data.mime_type, "application/octet-stream");
        let object = storage.get("docs/a.bin").await.unwrap();
        assert_eq!(object.metadata.unwrap().original_file_name, "original.bin");
    }

    #[tokio::test]
    async fn invalid_path_wins_over_bad_payload() {
        let (gateway, storage) = gateway();
        let err = gateway
            .handle(json_request(r#"{"path":["a","  "],"fileData":"%%%"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
        assert!(!storage.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_base64_writes_nothing() {
        let (gateway, storage) = gateway();
        let err = gateway
            .handle(json_request(r#"{"path":["x","y.txt"],"fileData":"@@not-base64@@"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
        assert!(!storage.exists("x/y.txt").await.unwrap());
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected() {
        let (gateway, _) = gateway();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "text/xml")
            .body(Body::from("<a/>"))
            .unwrap();
        assert!(matches!(
            gateway.handle(request).await,
            Err(AppError::UnsupportedMediaType(_))
        ));
    }
}
