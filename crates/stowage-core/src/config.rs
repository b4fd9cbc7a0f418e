//! Configuration module
//!
//! Configuration is read from the environment (after loading `.env` when present)
//! and validated once at startup.

use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_UPLOAD_SIZE_MB, DEFAULT_UPLOADED_BY};
use crate::storage_types::StorageBackend;
use crate::validation::PathPolicy;

const SERVER_PORT: u16 = 8080;
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// How uploaded objects are made publicly readable on S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicAccessMode {
    /// Apply the `public-read` canned ACL to each object.
    #[default]
    Acl,
    /// The bucket policy already grants public reads; publishing is a no-op.
    BucketPolicy,
}

impl FromStr for PublicAccessMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acl" => Ok(PublicAccessMode::Acl),
            "bucket-policy" | "bucket_policy" | "policy" => Ok(PublicAccessMode::BucketPolicy),
            _ => Err(anyhow::anyhow!("Invalid S3 public access mode: {}", s)),
        }
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

/// Gateway configuration: server settings plus storage and upload policy
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    pub bucket_name: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub aws_region: Option<String>,
    pub s3_public_access: PublicAccessMode,
    pub public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub max_upload_size_bytes: usize,
    pub uploaded_by: String,
    pub path_policy: PathPolicy,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl Config {
    fn as_gateway(&self) -> &GatewayConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_gateway().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = GatewayConfig::from_lookup(|name| env::var(name).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_gateway().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_gateway().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_gateway().base.cors_origins
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_gateway().base.request_timeout_secs
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_gateway().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_gateway().storage_backend
    }

    pub fn bucket_name(&self) -> &str {
        &self.as_gateway().bucket_name
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_gateway().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_gateway().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_gateway().aws_region.as_deref()
    }

    pub fn s3_public_access(&self) -> PublicAccessMode {
        self.as_gateway().s3_public_access
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.as_gateway().public_base_url.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_gateway().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_gateway().local_storage_base_url.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_gateway().max_upload_size_bytes
    }

    pub fn uploaded_by(&self) -> &str {
        &self.as_gateway().uploaded_by
    }

    pub fn path_policy(&self) -> PathPolicy {
        self.as_gateway().path_policy
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl GatewayConfig {
    /// Build configuration from a variable lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: match var("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            cors_origins,
            environment,
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .map(|s| {
                    s.parse::<u64>().map_err(|_| {
                        anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a whole number of seconds")
                    })
                })
                .transpose()?
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            log_format: var("LOG_FORMAT")
                .map(|s| s.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        };

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a whole number"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        let config = GatewayConfig {
            base,
            storage_backend: var("STORAGE_BACKEND")
                .map(|s| s.parse::<StorageBackend>())
                .transpose()?
                .unwrap_or(StorageBackend::S3),
            bucket_name: var("BUCKET_NAME")
                .or_else(|| var("S3_BUCKET"))
                .unwrap_or_default(),
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            s3_public_access: var("S3_PUBLIC_ACCESS")
                .map(|s| s.parse::<PublicAccessMode>())
                .transpose()?
                .unwrap_or_default(),
            public_base_url: var("PUBLIC_BASE_URL"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            max_upload_size_bytes,
            uploaded_by: var("UPLOADED_BY").unwrap_or_else(|| DEFAULT_UPLOADED_BY.to_string()),
            path_policy: var("PATH_POLICY")
                .map(|s| s.parse::<PathPolicy>())
                .transpose()?
                .unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.bucket_name.is_empty() {
            return Err(anyhow::anyhow!("BUCKET_NAME must be set"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.base.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }

        if self.base.cors_origins.is_empty() {
            return Err(anyhow::anyhow!("CORS_ORIGINS must name at least one origin"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}
