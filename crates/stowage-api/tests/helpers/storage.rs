//! Fault-injecting storage for exercising backend failure paths.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use stowage_core::{ObjectMetadata, StoredObject};
use stowage_storage::{MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};

/// Which operation fails, and how.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    MissingBucket,
    PutDenied,
    PutUnavailable,
    PublishDenied,
    PublishUnavailable,
    /// `put` sleeps this long before writing.
    SlowPut(Duration),
}

/// Wraps an in-memory store and fails the configured operation.
pub struct FaultyStorage {
    inner: MemoryStorage,
    fault: Fault,
}

impl FaultyStorage {
    pub fn new(bucket: &str, fault: Fault) -> Self {
        Self {
            inner: MemoryStorage::new(bucket),
            fault,
        }
    }

    fn put_error(&self) -> Option<StorageError> {
        match self.fault {
            Fault::MissingBucket => Some(StorageError::BucketNotFound(self.inner.bucket().to_string())),
            Fault::PutDenied => Some(StorageError::PermissionDenied("AccessDenied".to_string())),
            Fault::PutUnavailable => Some(StorageError::Unavailable(
                "connection reset by peer".to_string(),
            )),
            _ => None,
        }
    }

    fn publish_error(&self) -> Option<StorageError> {
        match self.fault {
            Fault::PublishDenied => Some(StorageError::PermissionDenied(
                "AccessControlListNotSupported".to_string(),
            )),
            Fault::PublishUnavailable => Some(StorageError::Unavailable(
                "timeout while setting ACL".to_string(),
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        if let Some(err) = self.put_error() {
            return Err(err);
        }
        if let Fault::SlowPut(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
        self.inner.put(key, data, content_type, metadata).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn make_public(&self, key: &str) -> StorageResult<()> {
        if let Some(err) = self.publish_error() {
            return Err(err);
        }
        self.inner.make_public(key).await
    }

    async fn is_public(&self, key: &str) -> StorageResult<bool> {
        self.inner.is_public(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}
