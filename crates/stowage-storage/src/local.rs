use crate::keys::{check_key, join_url};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stowage_core::{ObjectMetadata, StoredObject};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const OBJECTS_DIR: &str = "objects";
const META_DIR: &str = "meta";

/// On-disk suffixes. Folder segments, object files and sidecars never share a
/// name, so `docs` and `docs/x.txt` can both exist.
const FOLDER_SUFFIX: &str = ".d";
const OBJECT_SUFFIX: &str = ".obj";
const SIDECAR_SUFFIX: &str = ".json";

/// Sidecar record stored next to each object.
#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    metadata: Option<ObjectMetadata>,
    public: bool,
}

/// Removes a temp file unless the write that owns it completed.
///
/// Dropping an in-flight `put` future drops the guard, so abandoned uploads
/// never leave partial files behind.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Local filesystem storage implementation
///
/// The bucket is a directory `{base_path}/{bucket}` holding the object bytes
/// under `objects/` and sidecars with content type, metadata and visibility
/// under `meta/`. A key `docs/2024/a.txt` is stored as
/// `objects/docs.d/2024.d/a.txt.obj` and `meta/docs.d/2024.d/a.txt.json`.
#[derive(Clone)]
pub struct LocalStorage {
    bucket_root: PathBuf,
    bucket: String,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding bucket directories (e.g., "/var/lib/stowage")
    /// * `bucket` - Bucket name, created as a subdirectory of `base_path`
    /// * `base_url` - Base URL the objects are served from (e.g., "http://localhost:8080/objects")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let bucket = bucket.into();
        let bucket_root = base_path.into().join(&bucket);

        for dir in [OBJECTS_DIR, META_DIR] {
            let path = bucket_root.join(dir);
            fs::create_dir_all(&path).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            bucket_root,
            bucket,
            base_url: base_url.into(),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        disk_path(&self.bucket_root.join(OBJECTS_DIR), key, OBJECT_SUFFIX)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        disk_path(&self.bucket_root.join(META_DIR), key, SIDECAR_SUFFIX)
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        if fs::try_exists(&self.bucket_root).await? {
            Ok(())
        } else {
            Err(StorageError::BucketNotFound(self.bucket.clone()))
        }
    }

    async fn read_sidecar(&self, key: &str) -> StorageResult<Option<Sidecar>> {
        let path = self.sidecar_path(key);
        match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).map(Some).map_err(|e| {
                StorageError::Unavailable(format!(
                    "Corrupt metadata file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(e)),
        }
    }

    async fn write_sidecar(&self, key: &str, sidecar: &Sidecar) -> StorageResult<()> {
        let raw = serde_json::to_vec(sidecar)
            .map_err(|e| StorageError::Unavailable(format!("Failed to encode metadata: {}", e)))?;
        write_atomic(&self.sidecar_path(key), &raw).await
    }
}

/// Map a checked key below `root`: folder segments get `FOLDER_SUFFIX`, the
/// last segment gets `leaf_suffix`.
fn disk_path(root: &Path, key: &str, leaf_suffix: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut segments = key.split('/').peekable();
    while let Some(segment) = segments.next() {
        let suffix = if segments.peek().is_some() {
            FOLDER_SUFFIX
        } else {
            leaf_suffix
        };
        path.push(format!("{}{}", segment, suffix));
    }
    path
}

fn map_io_error(err: std::io::Error) -> StorageError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(err.to_string()),
        _ => StorageError::IoError(err),
    }
}

/// Write `data` to a sibling temp file, fsync it, then rename over `target`.
async fn write_atomic(target: &Path, data: &[u8]) -> StorageResult<()> {
    let parent = target.parent().ok_or_else(|| {
        StorageError::InvalidKey(format!("No parent directory for {}", target.display()))
    })?;
    fs::create_dir_all(parent).await.map_err(map_io_error)?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut guard = TempFileGuard::new(parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4())));

    let mut file = fs::File::create(guard.path()).await.map_err(map_io_error)?;
    file.write_all(data).await.map_err(map_io_error)?;
    file.sync_all().await.map_err(map_io_error)?;
    drop(file);

    fs::rename(guard.path(), target).await.map_err(map_io_error)?;
    guard.disarm();

    Ok(())
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        check_key(key)?;
        self.ensure_bucket().await?;

        let path = self.object_path(key);
        let size = data.len();
        let start = std::time::Instant::now();

        if let Err(e) = write_atomic(&path, &data).await {
            tracing::error!(
                error = %e,
                path = %path.display(),
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage put failed"
            );
            return Err(e);
        }

        self.write_sidecar(
            key,
            &Sidecar {
                content_type: content_type.to_string(),
                metadata: Some(metadata.clone()),
                public: false,
            },
        )
        .await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        check_key(key)?;
        self.ensure_bucket().await?;

        let path = self.object_path(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(map_io_error(e)),
        };
        let sidecar = self.read_sidecar(key).await?;

        let (content_type, metadata, public) = match sidecar {
            Some(s) => (s.content_type, s.metadata, s.public),
            None => (stowage_core::constants::DEFAULT_MIME_TYPE.to_string(), None, false),
        };

        Ok(StoredObject {
            key: key.to_string(),
            bytes: Bytes::from(data),
            content_type,
            metadata,
            public,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        self.ensure_bucket().await?;
        match fs::metadata(self.object_path(key)).await {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io_error(e)),
        }
    }

    async fn make_public(&self, key: &str) -> StorageResult<()> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let mut sidecar = self.read_sidecar(key).await?.unwrap_or(Sidecar {
            content_type: stowage_core::constants::DEFAULT_MIME_TYPE.to_string(),
            metadata: None,
            public: false,
        });
        if sidecar.public {
            return Ok(());
        }
        sidecar.public = true;
        self.write_sidecar(key, &sidecar).await?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Local object made public");
        Ok(())
    }

    async fn is_public(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        Ok(self
            .read_sidecar(key)
            .await?
            .map(|s| s.public)
            .unwrap_or(false))
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.base_url, key)
    }
}
