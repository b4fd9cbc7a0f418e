//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use stowage_core::{AppError, ObjectMetadata, StorageBackend, StoredObject};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket '{0}' not found")]
    BucketNotFound(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BucketNotFound(bucket) => {
                AppError::NotFound(format!("Bucket '{}' not found", bucket))
            }
            StorageError::NotFound(key) => AppError::NotFound(format!("Object '{}' not found", key)),
            StorageError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            StorageError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidPath(msg),
            StorageError::IoError(err) => AppError::StoreUnavailable(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Storage abstraction trait
///
/// The gateway only ever talks to a `dyn Storage`, so any backend (S3, local
/// filesystem, in-memory) can be injected at startup or in tests.
///
/// **Key format:** keys are `/`-joined path segments. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Name of the single bucket this backend writes to
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Write an object, replacing any existing object at `key`.
    ///
    /// Readers never observe a partially written object. A replaced object starts
    /// out private again.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()>;

    /// Read an object with its content type, metadata and visibility
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Grant unauthenticated read access to the object at `key`
    async fn make_public(&self, key: &str) -> StorageResult<()>;

    /// Whether the object at `key` is publicly readable
    async fn is_public(&self, key: &str) -> StorageResult<bool>;

    /// Deterministic public URL for `key`, derived from bucket identity and key only
    fn public_url(&self, key: &str) -> String;
}
