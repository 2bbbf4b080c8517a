//! Staybook Core - booking CSV normalization for short-term rentals
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: canonical booking rows, uploads, error taxonomy
//! - **ports**: the `StoreGateway` trait the pipeline appends through
//! - **services**: parsing, mapping, merging and upload orchestration
//! - **adapters**: DuckDB and in-memory stores

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbStore;
use config::Config;
use services::{CollectionsService, ImportService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, UploadOutcome};
pub use domain::{CanonicalBookingRecord, CellValue, Platform, Upload, UploadSummary};
pub use ports::StoreGateway;

/// Main context for Staybook operations
///
/// Holds the configuration, the store and the services built on it.
pub struct StaybookContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub import_service: ImportService,
    pub collections_service: CollectionsService,
}

impl StaybookContext {
    /// Load configuration from `staybook_dir` and open the store it names
    pub fn new(staybook_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(staybook_dir)
            .with_context(|| format!("Failed to create {}", staybook_dir.display()))?;

        let config = Config::load(staybook_dir)?;
        let store = Arc::new(
            DuckDbStore::open(&config.store)
                .with_context(|| format!("Failed to open {}", config.store.database_path.display()))?,
        );

        let import_service = ImportService::new(store.clone(), config.import.clone());
        let collections_service = CollectionsService::new(store.clone());

        Ok(Self {
            config,
            store,
            import_service,
            collections_service,
        })
    }
}
