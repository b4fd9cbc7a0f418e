use crate::attributes;
use crate::keys::{check_key, encode_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use std::collections::HashSet;
use stowage_core::{ObjectMetadata, StoredObject};
use tokio::sync::RwLock;

/// In-process storage backed by `object_store`'s `InMemory` store.
///
/// Used for tests and local development; contents are lost on restart.
pub struct MemoryStorage {
    store: InMemory,
    bucket: String,
    public_keys: RwLock<HashSet<String>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            store: InMemory::new(),
            bucket: bucket.into(),
            public_keys: RwLock::new(HashSet::new()),
        }
    }

    fn map_error(key: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
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
        check_key(key)?;
        let size = data.len();
        let location = Path::from(key);

        self.store
            .put_opts(
                &location,
                PutPayload::from(data),
                attributes::put_options(content_type, metadata),
            )
            .await
            .map_err(|e| Self::map_error(key, e))?;

        self.public_keys.write().await.remove(key);

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            "Memory storage put successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        check_key(key)?;
        let location = Path::from(key);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| Self::map_error(key, e))?;
        let attrs = result.attributes.clone();
        let bytes = result
            .bytes()
            .await
            .map_err(|e| Self::map_error(key, e))?;

        Ok(StoredObject {
            key: key.to_string(),
            bytes,
            content_type: attributes::content_type(&attrs),
            metadata: attributes::metadata(&attrs),
            public: self.public_keys.read().await.contains(key),
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    async fn make_public(&self, key: &str) -> StorageResult<()> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }
        self.public_keys.write().await.insert(key.to_string());
        Ok(())
    }

    async fn is_public(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        Ok(self.public_keys.read().await.contains(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, encode_key(key))
    }
}
