//! Upload pipeline
//!
//! Request → payload source → path validation → decode → store → publish → response.

pub mod service;
pub mod source;
pub mod types;

pub use service::UploadGateway;
pub use source::PayloadSource;
pub use types::{EncodedPayload, ParsedUpload, UploadSettings, UploadStage};
