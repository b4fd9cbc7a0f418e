//! Validation modules

pub mod path;

pub use path::{
    validate_path, PathError, PathPolicy, StorageKey, MAX_KEY_LENGTH, MAX_SEGMENT_LENGTH,
};
