//! Domain models

pub mod object;
pub mod upload;

pub use object::{ObjectMetadata, StoredObject};
pub use upload::{UploadData, UploadRequest, UploadResponse};
