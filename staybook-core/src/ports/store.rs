//! Store gateway port - the tabular store bookings are appended to

use std::collections::HashSet;

use crate::domain::result::Result;
use crate::domain::CellValue;

/// Outcome of [`StoreGateway::ensure_schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    AlreadyPresent,
}

/// What one conditional append did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendReport {
    /// Rows actually written
    pub written: usize,
    /// Ids of rows not written because the store already held them when the
    /// append started, in input order
    pub already_present: Vec<String>,
}

/// Append-only tabular store holding the canonical collection
///
/// A gateway is bound to one target collection. Callers read identifiers,
/// decide, then append, in that order. Implementations must serialize appends
/// per collection and only write rows whose identifier was absent when the
/// append started, so two uploads racing on the same id store it once.
pub trait StoreGateway: Send + Sync {
    /// Name of the collection this gateway writes to
    fn collection(&self) -> &str;

    /// Create the collection with `columns` as its header, or verify the
    /// existing header matches exactly. Safe to call repeatedly.
    fn ensure_schema(&self, columns: &[&str]) -> Result<SchemaStatus>;

    /// Every value of the identifier column, trimmed
    fn list_identifiers(&self) -> Result<HashSet<String>>;

    /// Append rows after the existing content, in order, skipping rows whose
    /// id is already stored
    fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<AppendReport>;

    /// Every collection except the canonical one
    fn list_collections(&self) -> Result<Vec<String>>;
}
