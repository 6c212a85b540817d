pub mod config;
pub mod distinct;
pub mod errors;
pub mod logger;
pub mod query;
pub mod response;
pub mod service;
pub mod store;
pub mod transport;
pub mod types;

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::errors::StoreError;
use crate::service::QueryService;
use crate::store::{MemoryStore, QueryExecutor};

pub use crate::query::RawRequest;
pub use crate::response::ResponseEnvelope;

/// Connects the store once and wires it into a [`QueryService`].
///
/// Without a `data_path` the store starts empty.
///
/// # Errors
/// Returns [`StoreError::Connect`] when the seed file cannot be loaded; the process
/// should not start serving in that case.
pub fn bootstrap(cfg: &ServiceConfig) -> Result<(Arc<MemoryStore>, QueryService), StoreError> {
    let store = match &cfg.data_path {
        Some(p) => MemoryStore::open(p)?,
        None => {
            log::warn!("no data_path configured; starting with an empty store");
            MemoryStore::new()
        }
    };
    let store = Arc::new(store);
    let executor: Arc<dyn QueryExecutor> = store.clone();
    let service = QueryService::new(executor).with_empty_filter_policy(cfg.empty_filter_policy());
    Ok((store, service))
}

/// Initializes logging from the configuration.
///
/// # Errors
/// Returns an error if the logger cannot be installed.
pub fn init_logging(cfg: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &cfg.log_config {
        Some(p) => logger::init_path(p),
        None => logger::configure_logging(
            cfg.log_dir.as_deref(),
            cfg.log_level.as_deref(),
            cfg.log_retention,
        ),
    }
}
