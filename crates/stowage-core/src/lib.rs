//! Stowage Core Library
//!
//! This crate provides the domain models, error types, configuration, and path
//! validation shared by the storage backends and the HTTP gateway.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, GatewayConfig, LogFormat, PublicAccessMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ObjectMetadata, StoredObject, UploadData, UploadRequest, UploadResponse};
pub use storage_types::StorageBackend;
pub use validation::{validate_path, PathError, PathPolicy, StorageKey};
