//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p stowage-api`.

pub mod storage;

use axum_test::TestServer;
use std::sync::Arc;
use stowage_api::setup::routes;
use stowage_api::state::AppState;
use stowage_core::{Config, GatewayConfig};
use stowage_storage::{MemoryStorage, Storage};

pub const TEST_BUCKET: &str = "test-uploads";

/// Configuration for the in-memory backend with optional overrides.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: Vec<(String, String)> = vec![
        ("STORAGE_BACKEND".to_string(), "memory".to_string()),
        ("BUCKET_NAME".to_string(), TEST_BUCKET.to_string()),
        ("UPLOADED_BY".to_string(), "integration-test".to_string()),
    ];
    for (name, value) in overrides {
        vars.retain(|(n, _)| n.as_str() != *name);
        vars.push((name.to_string(), value.to_string()));
    }

    let gateway = GatewayConfig::from_lookup(|name| {
        vars.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    })
    .expect("valid test configuration");
    Config(Box::new(gateway))
}

/// Test application: server plus a handle on the backing store.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<dyn Storage>,
}

/// Build a test app over any storage backend.
pub fn setup_app_with(config: Config, storage: Arc<dyn Storage>) -> TestApp {
    let state = Arc::new(AppState::new(config.clone(), storage.clone()));
    let router = routes::setup_routes(&config, state).expect("routes");
    let server = TestServer::new(router).expect("test server");
    TestApp { server, storage }
}

/// Build a test app over a fresh in-memory bucket.
pub fn setup_test_app() -> TestApp {
    setup_app_with(
        test_config(&[]),
        Arc::new(MemoryStorage::new(TEST_BUCKET)),
    )
}
