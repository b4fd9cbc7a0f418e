//! Key checks and URL building shared by all backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the bucket namespace or address a directory.
pub fn check_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key must not start or end with '/'".to_string(),
        ));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains an empty or relative segment".to_string(),
        ));
    }
    Ok(())
}

/// Percent-encode each segment while keeping `/` as the separator.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a base URL and a key: `{base}/{encoded key}`.
pub fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), encode_key(key))
}
