//! Pickem Service
//!
//! Hosts the pick engine behind a warp HTTP server: configuration loading,
//! logging setup, store selection and the REST routes.

pub mod api;
pub mod config;
pub mod logging;

pub use api::create_routes;
pub use config::{load_config, Cli, LoggingConfig, ServerConfig, ServiceConfig};
pub use logging::initialize_logging_with_config;

use anyhow::{Context, Result};
use pick_engine::{InMemoryPickStore, PickService, PickStore};
use pick_store::PgPickStore;
use std::sync::Arc;

/// Open the configured store and wrap it in a [`PickService`]
pub async fn build_service(config: &ServiceConfig) -> Result<PickService> {
    let store: Arc<dyn PickStore> = match &config.database {
        Some(database) => {
            let store =
                PgPickStore::connect(database).await.context("Failed to connect to database")?;
            if config.run_migrations {
                store.migrate().await.context("Failed to apply migrations")?;
            }
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured; serving from an empty in-memory store");
            Arc::new(InMemoryPickStore::new())
        }
    };

    Ok(PickService::new(store, config.season.clone()))
}
