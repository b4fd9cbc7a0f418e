//! Stowage API Library
//!
//! This crate provides the HTTP surface of the gateway: payload decoding, the
//! upload pipeline, handlers, middleware, and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::{UploadGateway, UploadSettings};
pub use state::AppState;
