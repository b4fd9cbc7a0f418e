//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use stowage_core::{Config, PathPolicy};

/// Validate critical configuration values
///
/// Runs the core checks (bucket, backend settings, bounds) and then the
/// deployment checks that only matter for the HTTP server.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!(
            "CORS allows all origins (*) in production; set CORS_ORIGINS to restrict browser uploads"
        );
    }

    if config.path_policy() == PathPolicy::Lenient {
        tracing::warn!("PATH_POLICY=lenient accepts any non-separator characters in path segments");
    }

    let max_mb = config.max_upload_size_bytes() / 1024 / 1024;
    if max_mb > 1024 {
        tracing::warn!(
            max_upload_mb = max_mb,
            "MAX_UPLOAD_SIZE_MB is above 1 GiB; uploads are buffered in memory"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
