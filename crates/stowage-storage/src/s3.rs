use crate::attributes;
use crate::keys::{check_key, encode_key, join_url};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{ObjectCannedAcl, Permission};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use stowage_core::{ObjectMetadata, PublicAccessMode, StoredObject};

/// Grantee URI S3 uses for anonymous read access.
const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Settings for [`S3Storage`].
#[derive(Debug, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (e.g. "http://localhost:9000" for MinIO)
    pub endpoint_url: Option<String>,
    pub public_access: PublicAccessMode,
    /// Overrides the URL prefix issued for public objects (e.g. a CDN)
    pub public_base_url: Option<String>,
}

impl S3StorageConfig {
    /// Public URL for a key.
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
    pub fn object_url(&self, key: &str) -> String {
        if let Some(ref base) = self.public_base_url {
            join_url(base, key)
        } else if let Some(ref endpoint) = self.endpoint_url {
            format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                encode_key(key)
            )
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket,
                self.region,
                encode_key(key)
            )
        }
    }
}

/// S3 storage implementation
///
/// Object data goes through `object_store`; ACL changes go through `aws-sdk-s3`,
/// which `object_store` does not expose.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    acl_client: S3Client,
    config: S3StorageConfig,
}

impl S3Storage {
    pub async fn new(config: S3StorageConfig) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(config.region.clone())
            .with_bucket_name(config.bucket.clone());

        if let Some(ref endpoint) = config.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http)
                .with_virtual_hosted_style_request(false);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = config.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }
        let acl_client = S3Client::from_conf(s3_config.build());

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint_url,
            public_access = ?config.public_access,
            "S3 storage initialized"
        );

        Ok(S3Storage {
            store,
            acl_client,
            config,
        })
    }

    fn map_write_error(&self, err: ObjectStoreError) -> StorageError {
        map_object_store_error(&self.config.bucket, None, err)
    }

    fn map_read_error(&self, key: &str, err: ObjectStoreError) -> StorageError {
        map_object_store_error(&self.config.bucket, Some(key), err)
    }
}

/// Classify an `object_store` failure. A 404 on a write can only mean the
/// bucket is missing; on a read it means the key is.
fn map_object_store_error(bucket: &str, read_key: Option<&str>, err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => match read_key {
            Some(key) => StorageError::NotFound(key.to_string()),
            None => StorageError::BucketNotFound(bucket.to_string()),
        },
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::PermissionDenied(err.to_string())
        }
        other => {
            let message = other.to_string();
            if message.contains("NoSuchBucket") {
                StorageError::BucketNotFound(bucket.to_string())
            } else {
                StorageError::Unavailable(message)
            }
        }
    }
}

/// Classify an `aws-sdk-s3` failure from its service error code.
fn map_sdk_error<E, R>(bucket: &str, key: &str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("NoSuchBucket") => StorageError::BucketNotFound(bucket.to_string()),
        Some("NoSuchKey") => StorageError::NotFound(key.to_string()),
        Some("AccessDenied") | Some("AccessControlListNotSupported") | Some("AllAccessDisabled") => {
            StorageError::PermissionDenied(
                err.message()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Access denied".to_string()),
            )
        }
        _ => StorageError::Unavailable(format!("{:?}", err)),
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        check_key(key)?;
        let size = data.len() as u64;
        let location = Path::from(key);
        let start = std::time::Instant::now();

        let result = self
            .store
            .put_opts(
                &location,
                PutPayload::from(data),
                attributes::put_options(content_type, metadata),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.config.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            self.map_write_error(e)
        })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        check_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key);

        let result = self.store.get(&location).await.map_err(|e| {
            if !matches!(e, ObjectStoreError::NotFound { .. }) {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 get failed"
                );
            }
            self.map_read_error(key, e)
        })?;

        let attrs = result.attributes.clone();
        let bytes = result
            .bytes()
            .await
            .map_err(|e| self.map_read_error(key, e))?;
        let public = self.is_public(key).await?;

        tracing::debug!(
            bucket = %self.config.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );

        Ok(StoredObject {
            key: key.to_string(),
            bytes,
            content_type: attributes::content_type(&attrs),
            metadata: attributes::metadata(&attrs),
            public,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.map_write_error(e)),
        }
    }

    async fn make_public(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        if self.config.public_access == PublicAccessMode::BucketPolicy {
            tracing::debug!(
                bucket = %self.config.bucket,
                key = %key,
                "Bucket policy grants public read, skipping ACL"
            );
            return Ok(());
        }

        let start = std::time::Instant::now();
        self.acl_client
            .put_object_acl()
            .bucket(&self.config.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                let err = map_sdk_error(&self.config.bucket, key, e);
                tracing::error!(
                    error = %err,
                    bucket = %self.config.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put_object_acl failed"
                );
                err
            })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 object made public"
        );

        Ok(())
    }

    async fn is_public(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        if self.config.public_access == PublicAccessMode::BucketPolicy {
            return self.exists(key).await;
        }

        let output = self
            .acl_client
            .get_object_acl()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(&self.config.bucket, key, e))?;

        Ok(output.grants().iter().any(|grant| {
            let everyone = grant
                .grantee()
                .and_then(|grantee| grantee.uri())
                .is_some_and(|uri| uri == ALL_USERS_URI);
            let readable = matches!(
                grant.permission(),
                Some(Permission::Read) | Some(Permission::FullControl)
            );
            everyone && readable
        }))
    }

    fn public_url(&self, key: &str) -> String {
        self.config.object_url(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3StorageConfig {
        S3StorageConfig {
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            public_access: PublicAccessMode::Acl,
            public_base_url: None,
        }
    }

    #[test]
    fn aws_url_uses_virtual_hosted_style() {
        assert_eq!(
            config().object_url("test/hello.txt"),
            "https://uploads.s3.us-east-1.amazonaws.com/test/hello.txt"
        );
    }

    #[test]
    fn endpoint_url_uses_path_style() {
        let cfg = S3StorageConfig {
            endpoint_url: Some("http://localhost:9000/".to_string()),
            ..config()
        };
        assert_eq!(
            cfg.object_url("a b/c.txt"),
            "http://localhost:9000/uploads/a%20b/c.txt"
        );
    }

    #[test]
    fn public_base_url_overrides_everything() {
        let cfg = S3StorageConfig {
            endpoint_url: Some("http://localhost:9000".to_string()),
            public_base_url: Some("https://cdn.example.com".to_string()),
            ..config()
        };
        assert_eq!(
            cfg.object_url("test/hello.txt"),
            "https://cdn.example.com/test/hello.txt"
        );
    }

    #[test]
    fn not_found_on_write_means_missing_bucket() {
        let err = ObjectStoreError::NotFound {
            path: "test/hello.txt".to_string(),
            source: "404".into(),
        };
        assert!(matches!(
            map_object_store_error("uploads", None, err),
            StorageError::BucketNotFound(ref b) if b == "uploads"
        ));
    }

    #[test]
    fn not_found_on_read_means_missing_key() {
        let err = ObjectStoreError::NotFound {
            path: "test/hello.txt".to_string(),
            source: "404".into(),
        };
        assert!(matches!(
            map_object_store_error("uploads", Some("test/hello.txt"), err),
            StorageError::NotFound(_)
        ));
    }

    #[test]
    fn permission_errors_are_classified() {
        let err = ObjectStoreError::PermissionDenied {
            path: "k".to_string(),
            source: "403".into(),
        };
        assert!(matches!(
            map_object_store_error("uploads", None, err),
            StorageError::PermissionDenied(_)
        ));
    }

    #[test]
    fn other_errors_are_unavailable() {
        let err = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(matches!(
            map_object_store_error("uploads", None, err),
            StorageError::Unavailable(_)
        ));
    }
}
