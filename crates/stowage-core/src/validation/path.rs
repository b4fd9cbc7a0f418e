//! Logical path validation.
//!
//! A logical path is an ordered list of segments: folders first, file name last.
//! Validation trims each segment, rejects anything that could be reinterpreted by a
//! backend (separators, dot segments, control characters) and joins the result with
//! `/` into the object key.

use std::fmt;
use std::str::FromStr;

/// Maximum length of a full key in bytes (S3 and GCS both cap object names at 1024).
pub const MAX_KEY_LENGTH: usize = 1024;

/// Maximum length of a single segment in bytes.
pub const MAX_SEGMENT_LENGTH: usize = 255;

/// Punctuation accepted by the strict policy in addition to alphanumerics.
const STRICT_PUNCTUATION: &str = " ._-()+,@=~";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path must be a non-empty array of strings")]
    Empty,

    #[error("path segment {index} is empty")]
    EmptySegment { index: usize },

    #[error("path segment {index} contains a path separator")]
    Separator { index: usize },

    #[error("path segment {index} is a relative reference ('.' or '..')")]
    DotSegment { index: usize },

    #[error("path segment {index} contains a control character")]
    ControlCharacter { index: usize },

    #[error("path segment {index} contains disallowed character {ch:?}")]
    DisallowedCharacter { index: usize, ch: char },

    #[error("path segment {index} exceeds {MAX_SEGMENT_LENGTH} bytes")]
    SegmentTooLong { index: usize },

    #[error("path exceeds {MAX_KEY_LENGTH} bytes once joined")]
    KeyTooLong,
}

/// Character policy applied to each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// Alphanumerics plus a small punctuation set.
    #[default]
    Strict,
    /// Any UTF-8 apart from separators and control characters.
    Lenient,
}

impl FromStr for PathPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(PathPolicy::Strict),
            "lenient" => Ok(PathPolicy::Lenient),
            _ => Err(anyhow::anyhow!("Invalid path policy: {}", s)),
        }
    }
}

impl fmt::Display for PathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPolicy::Strict => write!(f, "strict"),
            PathPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// A validated object key. Only `validate_path` constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    key: String,
}

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The last segment: the logical file name.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.key.split('/')
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

fn check_segment(index: usize, segment: &str, policy: PathPolicy) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment { index });
    }
    if segment == "." || segment == ".." {
        return Err(PathError::DotSegment { index });
    }
    if segment.len() > MAX_SEGMENT_LENGTH {
        return Err(PathError::SegmentTooLong { index });
    }

    for ch in segment.chars() {
        if ch == '/' || ch == '\\' {
            return Err(PathError::Separator { index });
        }
        if ch.is_control() {
            return Err(PathError::ControlCharacter { index });
        }
        if policy == PathPolicy::Strict
            && !(ch.is_alphanumeric() || STRICT_PUNCTUATION.contains(ch))
        {
            return Err(PathError::DisallowedCharacter { index, ch });
        }
    }

    Ok(())
}

/// Normalize and validate a logical path into a storage key.
///
/// Segments are trimmed and joined with `/` in input order. Pure: no side effects.
pub fn validate_path<S: AsRef<str>>(
    segments: &[S],
    policy: PathPolicy,
) -> Result<StorageKey, PathError> {
    if segments.is_empty() {
        return Err(PathError::Empty);
    }

    let mut normalized = Vec::with_capacity(segments.len());
    for (index, raw) in segments.iter().enumerate() {
        let segment = raw.as_ref().trim();
        check_segment(index, segment, policy)?;
        normalized.push(segment);
    }

    let key = normalized.join("/");
    if key.len() > MAX_KEY_LENGTH {
        return Err(PathError::KeyTooLong);
    }

    Ok(StorageKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn joins_segments_in_order() {
        let key = validate_path(&["test", "hello.txt"], PathPolicy::Strict).unwrap();
        assert_eq!(key.as_str(), "test/hello.txt");
        assert_eq!(key.file_name(), "hello.txt");
        assert_eq!(key.segments().count(), 2);
    }

    #[test]
    fn single_segment_is_a_file_name() {
        let key = validate_path(&["report.pdf"], PathPolicy::Strict).unwrap();
        assert_eq!(key.as_str(), "report.pdf");
        assert_eq!(key.file_name(), "report.pdf");
    }

    #[test]
    fn trims_segments() {
        let key = validate_path(&["  users ", "42", " avatar.png"], PathPolicy::Strict).unwrap();
        assert_eq!(key.as_str(), "users/42/avatar.png");
    }

    #[test]
    fn rejects_empty_sequence() {
        let empty: [&str; 0] = [];
        let err = validate_path(&empty, PathPolicy::Lenient).unwrap_err();
        assert_eq!(err, PathError::Empty);
        assert!(err.to_string().contains("non-empty array"));
    }

    #[test]
    fn rejects_blank_segments() {
        assert_eq!(
            validate_path(&["a", "   ", "b.txt"], PathPolicy::Lenient),
            Err(PathError::EmptySegment { index: 1 })
        );
        assert_eq!(
            validate_path(&[""], PathPolicy::Strict),
            Err(PathError::EmptySegment { index: 0 })
        );
    }

    #[test]
    fn rejects_embedded_separators_under_both_policies() {
        for policy in [PathPolicy::Strict, PathPolicy::Lenient] {
            assert_eq!(
                validate_path(&["a/b", "c.txt"], policy),
                Err(PathError::Separator { index: 0 })
            );
            assert_eq!(
                validate_path(&["a", "c\\d.txt"], policy),
                Err(PathError::Separator { index: 1 })
            );
        }
    }

    #[test]
    fn rejects_dot_segments() {
        assert_eq!(
            validate_path(&["..", "etc", "passwd"], PathPolicy::Lenient),
            Err(PathError::DotSegment { index: 0 })
        );
        assert_eq!(
            validate_path(&["a", "."], PathPolicy::Strict),
            Err(PathError::DotSegment { index: 1 })
        );
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(
            validate_path(&["a\u{0}b"], PathPolicy::Lenient),
            Err(PathError::ControlCharacter { index: 0 })
        );
    }

    #[test]
    fn strict_rejects_what_lenient_accepts() {
        let segments = ["notes", "q3#draft?.md"];
        assert!(matches!(
            validate_path(&segments, PathPolicy::Strict),
            Err(PathError::DisallowedCharacter { index: 1, ch: '#' })
        ));
        assert_eq!(
            validate_path(&segments, PathPolicy::Lenient).unwrap().as_str(),
            "notes/q3#draft?.md"
        );
    }

    #[test]
    fn strict_accepts_unicode_letters() {
        let key = validate_path(&["photos", "café (1).jpg"], PathPolicy::Strict).unwrap();
        assert_eq!(key.as_str(), "photos/café (1).jpg");
    }

    #[test]
    fn enforces_length_limits() {
        let long_segment = "a".repeat(MAX_SEGMENT_LENGTH + 1);
        assert_eq!(
            validate_path(&[long_segment.as_str()], PathPolicy::Strict),
            Err(PathError::SegmentTooLong { index: 0 })
        );

        let segment = "b".repeat(200);
        let many: Vec<&str> = std::iter::repeat(segment.as_str()).take(6).collect();
        assert_eq!(
            validate_path(many.as_slice(), PathPolicy::Strict),
            Err(PathError::KeyTooLong)
        );
    }

    #[test]
    fn parses_policy() {
        assert_eq!("STRICT".parse::<PathPolicy>().unwrap(), PathPolicy::Strict);
        assert_eq!("lenient".parse::<PathPolicy>().unwrap(), PathPolicy::Lenient);
        assert!("open".parse::<PathPolicy>().is_err());
    }

    proptest! {
        #[test]
        fn whitespace_segment_always_fails(
            prefix in proptest::collection::vec("[a-z0-9]{1,8}", 0..4),
            blank in "[ \t]{0,4}",
            suffix in proptest::collection::vec("[a-z0-9]{1,8}", 0..4),
        ) {
            let mut segments = prefix.clone();
            segments.push(blank);
            segments.extend(suffix);
            let result = validate_path(segments.as_slice(), PathPolicy::Lenient);
            prop_assert_eq!(result, Err(PathError::EmptySegment { index: prefix.len() }));
        }

        #[test]
        fn valid_segments_join_with_slash(
            segments in proptest::collection::vec("[A-Za-z0-9_-]{1,16}", 1..6),
        ) {
            let key = validate_path(segments.as_slice(), PathPolicy::Strict).unwrap();
            prop_assert_eq!(key.as_str(), segments.join("/"));
            prop_assert_eq!(key.segments().count(), segments.len());
        }
    }
}
