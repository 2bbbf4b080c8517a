//! Configuration management
//!
//! Settings live in `settings.json` inside the staybook directory:
//! ```json
//! {
//!   "store": { "databaseFile": "staybook.duckdb", "collection": "Data" },
//!   "import": { "locale": "fr", "stripDiacritics": false, "dedupeWithinBatch": false }
//! }
//! ```
//! Loaded once at startup and passed down explicitly; nothing below this
//! module reads the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::services::fields::MonthLocale;
use crate::services::mapper::MapperOptions;

/// Default name of the canonical collection
pub const DEFAULT_COLLECTION: &str = "Data";

const DEFAULT_DATABASE_FILE: &str = "staybook.duckdb";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    store: StoreSettings,
    #[serde(default)]
    import: ImportSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
}

/// Import behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    #[serde(default)]
    pub locale: MonthLocale,
    #[serde(default)]
    pub strip_diacritics: bool,
    /// Drop repeated ids inside a single file before merging
    #[serde(default)]
    pub dedupe_within_batch: bool,
}

impl ImportSettings {
    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            locale: self.locale,
            strip_diacritics: self.strip_diacritics,
        }
    }
}

/// Everything a store adapter needs to open its collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub collection: String,
}

/// Staybook configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub import: ImportSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the staybook directory
    ///
    /// The target collection can be overridden with `STAYBOOK_COLLECTION`.
    pub fn load(staybook_dir: &Path) -> Result<Self> {
        let settings_path = staybook_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let collection = match std::env::var("STAYBOOK_COLLECTION").ok() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => raw
                .store
                .collection
                .clone()
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        };

        Self::from_parts(staybook_dir, raw, collection)
    }

    fn from_parts(staybook_dir: &Path, raw: SettingsFile, collection: String) -> Result<Self> {
        if collection.trim().is_empty() {
            bail!("Store collection name must not be empty");
        }

        let database_file = raw
            .store
            .database_file
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string());

        Ok(Self {
            store: StoreConfig {
                database_path: staybook_dir.join(database_file),
                collection,
            },
            import: raw.import.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the staybook directory
    /// Preserves other settings that staybook doesn't manage
    pub fn save(&self, staybook_dir: &Path) -> Result<()> {
        let settings_path = staybook_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        settings.store.collection = Some(self.store.collection.clone());
        settings.import = self.import.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
