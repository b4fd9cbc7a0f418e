//! Application state shared by all handlers.

use std::sync::Arc;

use stowage_core::Config;
use stowage_storage::Storage;

use crate::services::upload::{UploadGateway, UploadSettings};

/// Immutable per-process state. Handlers receive it as `State<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub gateway: UploadGateway,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let gateway = UploadGateway::new(storage.clone(), UploadSettings::from_config(&config));
        Self {
            config,
            storage,
            gateway,
        }
    }
}
