use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::constants::{META_ORIGINAL_FILE_NAME, META_UPLOADED_AT, META_UPLOADED_BY};

/// Custom metadata written alongside every stored object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObjectMetadata {
    pub original_file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
}

impl ObjectMetadata {
    pub fn new(original_file_name: impl Into<String>, uploaded_by: impl Into<String>) -> Self {
        Self {
            original_file_name: original_file_name.into(),
            uploaded_at: Utc::now(),
            uploaded_by: uploaded_by.into(),
        }
    }

    /// Flatten into backend attribute pairs (`uploaded_at` as RFC 3339, millisecond precision).
    pub fn to_pairs(&self) -> [(&'static str, String); 3] {
        [
            (META_ORIGINAL_FILE_NAME, self.original_file_name.clone()),
            (
                META_UPLOADED_AT,
                self.uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (META_UPLOADED_BY, self.uploaded_by.clone()),
        ]
    }

    /// Rebuild from attribute pairs. Missing or unparsable entries yield `None`.
    pub fn from_pairs<'a, I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut original_file_name = None;
        let mut uploaded_at = None;
        let mut uploaded_by = None;

        for (name, value) in pairs {
            match name {
                META_ORIGINAL_FILE_NAME => original_file_name = Some(value.to_string()),
                META_UPLOADED_AT => {
                    uploaded_at = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }
                META_UPLOADED_BY => uploaded_by = Some(value.to_string()),
                _ => {}
            }
        }

        Some(Self {
            original_file_name: original_file_name?,
            uploaded_at: uploaded_at?,
            uploaded_by: uploaded_by?,
        })
    }
}

/// An object as read back from a backend.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub metadata: Option<ObjectMetadata>,
    pub public: bool,
}

impl StoredObject {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
