//! In-memory store, used by tests and dry runs

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::domain::result::{Error, Result};
use crate::domain::{CellValue, ID_COLUMN};
use crate::ports::{AppendReport, SchemaStatus, StoreGateway};

#[derive(Debug, Default)]
struct Collection {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    append_calls: Vec<usize>,
    unavailable: Option<String>,
    append_failure: Option<String>,
}

/// Store gateway keeping every collection in memory
#[derive(Debug)]
pub struct InMemoryStore {
    collection: String,
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Add a non-canonical collection (shows up in `list_collections`)
    pub fn with_collection(self, name: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.collections.entry(name.into()).or_default();
        }
        self
    }

    /// Make every further call fail with `StoreUnavailable`
    pub fn set_unavailable(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = Some(message.into());
        }
    }

    /// Make further appends fail with `StoreUnavailable`; reads keep working
    pub fn fail_appends(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.append_failure = Some(message.into());
        }
    }

    /// Rows of the canonical collection, in append order
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        self.state
            .lock()
            .map(|s| {
                s.collections
                    .get(&self.collection)
                    .map(|c| c.rows.clone())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Number of rows written by each non-empty append call
    pub fn append_calls(&self) -> Vec<usize> {
        self.state.lock().map(|s| s.append_calls.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        let state = self
            .state
            .lock()
            .map_err(|e| Error::store(format!("Lock poisoned: {}", e)))?;
        if let Some(message) = &state.unavailable {
            return Err(Error::store(message.clone()));
        }
        Ok(state)
    }
}

fn identifiers(collection: &Collection) -> HashSet<String> {
    collection
        .rows
        .iter()
        .filter_map(|row| row.get(ID_COLUMN).and_then(CellValue::as_text))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

impl StoreGateway for InMemoryStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn ensure_schema(&self, columns: &[&str]) -> Result<SchemaStatus> {
        let mut state = self.lock()?;
        if let Some(existing) = state.collections.get(&self.collection) {
            if existing.header.iter().map(String::as_str).eq(columns.iter().copied()) {
                return Ok(SchemaStatus::AlreadyPresent);
            }
            return Err(Error::SchemaMismatch {
                expected: columns.iter().map(|c| c.to_string()).collect(),
                found: existing.header.clone(),
            });
        }

        state.collections.insert(
            self.collection.clone(),
            Collection {
                header: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
        Ok(SchemaStatus::Created)
    }

    fn list_identifiers(&self) -> Result<HashSet<String>> {
        let state = self.lock()?;
        Ok(state
            .collections
            .get(&self.collection)
            .map(identifiers)
            .unwrap_or_default())
    }

    fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<AppendReport> {
        if rows.is_empty() {
            return Ok(AppendReport::default());
        }
        let mut state = self.lock()?;
        if let Some(message) = &state.append_failure {
            return Err(Error::store(message.clone()));
        }
        let target = state
            .collections
            .get_mut(&self.collection)
            .ok_or_else(|| Error::store(format!("Collection '{}' does not exist", self.collection)))?;

        let present = identifiers(target);
        let mut report = AppendReport::default();
        for row in rows {
            let id = row.get(ID_COLUMN).and_then(CellValue::as_text).unwrap_or_default();
            let id = id.trim();
            if present.contains(id) {
                report.already_present.push(id.to_string());
                continue;
            }
            target.rows.push(row.clone());
            report.written += 1;
        }

        state.append_calls.push(report.written);
        Ok(report)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .collections
            .keys()
            .filter(|name| **name != self.collection)
            .cloned()
            .collect())
    }
}
