//! Stowage Storage Library
//!
//! This crate provides the object store abstraction the gateway writes through, and
//! its S3, local filesystem and in-memory implementations.
//!
//! # Key format
//!
//! Keys are the `/`-joined segments of a validated logical path, e.g.
//! `invoices/2024/march.pdf`. Backends additionally refuse keys with a leading `/`,
//! empty segments or `..`, so a key can never escape the bucket namespace.

mod attributes;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Storage, S3StorageConfig};
pub use stowage_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
