//! DuckDB store implementation
//!
//! Each collection is a table whose columns are the collection header, all
//! `VARCHAR` so date text is never coerced. A trailing `_seq` column keeps
//! append order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use duckdb::{params, Connection};

use crate::config::StoreConfig;
use crate::domain::result::{Error, Result as CoreResult};
use crate::domain::{CellValue, ID_COLUMN};
use crate::ports::{AppendReport, SchemaStatus, StoreGateway};

/// Hidden column holding the append position of each row
const SEQ_COLUMN: &str = "_seq";

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
}

/// Quote an identifier for use in SQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// DuckDB-backed store gateway bound to one collection
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    collection: String,
}

impl DuckDbStore {
    /// Open (or create) the store file named in `config`
    ///
    /// Retries with exponential backoff while another process holds the
    /// database file lock.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(&config.database_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(config.database_path.clone()),
                        collection: config.collection.clone(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[staybook] Store busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open store after {} retries", MAX_RETRIES)))
    }

    /// In-memory store, for previews and tests
    pub fn open_in_memory(collection: impl Into<String>) -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory_with_flags(config)?),
            db_path: None,
            collection: collection.into(),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Path of the database file (`None` when in memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Header of `table`, without the hidden sequence column. Empty when the
    /// table does not exist.
    fn table_header(conn: &Connection, table: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ?
             ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns.into_iter().filter(|c| c != SEQ_COLUMN).collect())
    }

    fn ensure_table(&self, columns: &[&str]) -> Result<SchemaStatus> {
        let conn = self.lock()?;
        let existing = Self::table_header(&conn, &self.collection)?;

        if !existing.is_empty() {
            if existing.iter().map(String::as_str).eq(columns.iter().copied()) {
                return Ok(SchemaStatus::AlreadyPresent);
            }
            return Err(Error::SchemaMismatch {
                expected: columns.iter().map(|c| c.to_string()).collect(),
                found: existing,
            }
            .into());
        }

        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("{} VARCHAR", quote_ident(c)))
            .chain(std::iter::once(format!("{} BIGINT NOT NULL", quote_ident(SEQ_COLUMN))))
            .collect();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.collection),
            column_defs.join(", ")
        ))?;
        Ok(SchemaStatus::Created)
    }

    fn identifiers(conn: &Connection, table: &str) -> Result<HashSet<String>> {
        let header = Self::table_header(conn, table)?;
        let Some(id_column) = header.get(ID_COLUMN) else {
            return Ok(HashSet::new());
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {id} FROM {table} WHERE {id} IS NOT NULL",
            id = quote_ident(id_column),
            table = quote_ident(table)
        ))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect())
    }

    fn insert_absent(&self, rows: &[Vec<CellValue>]) -> Result<AppendReport> {
        let mut conn = self.lock()?;
        let header = Self::table_header(&conn, &self.collection)?;
        if header.is_empty() {
            return Err(anyhow!("Collection '{}' does not exist", self.collection));
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != header.len()) {
            return Err(anyhow!(
                "Row has {} cells, collection '{}' has {} columns",
                bad.len(),
                self.collection,
                header.len()
            ));
        }

        let tx = conn.transaction()?;

        // Ids present when this append started; rows of the same batch are not
        // compared with each other here
        let present = Self::identifiers(&tx, &self.collection)?;
        let mut next_seq: i64 = tx.query_row(
            &format!(
                "SELECT COALESCE(MAX({}), 0) FROM {}",
                quote_ident(SEQ_COLUMN),
                quote_ident(&self.collection)
            ),
            [],
            |row| row.get(0),
        )?;

        let placeholders = vec!["?"; header.len() + 1].join(", ");
        let mut report = AppendReport::default();
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quote_ident(&self.collection),
                placeholders
            ))?;

            for row in rows {
                let id = row[ID_COLUMN].as_text().unwrap_or_default();
                let id = id.trim();
                if present.contains(id) {
                    report.already_present.push(id.to_string());
                    continue;
                }
                next_seq += 1;
                let cells: Vec<Option<String>> = row.iter().map(CellValue::as_text).collect();
                let mut values: Vec<&dyn duckdb::ToSql> =
                    cells.iter().map(|c| c as &dyn duckdb::ToSql).collect();
                values.push(&next_seq);
                stmt.execute(values.as_slice())?;
                report.written += 1;
            }
        }

        tx.commit()?;
        Ok(report)
    }

    fn collections(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main'
             ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names.into_iter().filter(|n| *n != self.collection).collect())
    }

    /// Create another (non-canonical) collection, e.g. a per-listing sheet
    pub fn create_collection(&self, name: &str, columns: &[&str]) -> Result<()> {
        let conn = self.lock()?;
        let column_defs: Vec<String> =
            columns.iter().map(|c| format!("{} VARCHAR", quote_ident(c))).collect();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(name),
            column_defs.join(", ")
        ))?;
        Ok(())
    }

    /// All rows of the canonical collection in append order; blanks are `None`
    pub fn read_rows(&self) -> Result<Vec<Vec<Option<String>>>> {
        let conn = self.lock()?;
        let header = Self::table_header(&conn, &self.collection)?;
        if header.is_empty() {
            return Ok(Vec::new());
        }

        let select_list: Vec<String> = header.iter().map(|c| quote_ident(c)).collect();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY {}",
            select_list.join(", "),
            quote_ident(&self.collection),
            quote_ident(SEQ_COLUMN)
        ))?;

        let width = header.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of rows in the canonical collection
    pub fn row_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        if Self::table_header(&conn, &self.collection)?.is_empty() {
            return Ok(0);
        }
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(&self.collection)),
            params![],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Store failures surface as `StoreUnavailable`, except header mismatches
fn to_store_error(err: anyhow::Error) -> Error {
    match err.downcast::<Error>() {
        Ok(core) => core,
        Err(other) => Error::store(other.to_string()),
    }
}

impl StoreGateway for DuckDbStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn ensure_schema(&self, columns: &[&str]) -> CoreResult<SchemaStatus> {
        self.ensure_table(columns).map_err(to_store_error)
    }

    fn list_identifiers(&self) -> CoreResult<HashSet<String>> {
        self.lock()
            .and_then(|conn| Self::identifiers(&conn, &self.collection))
            .map_err(to_store_error)
    }

    fn append_rows(&self, rows: &[Vec<CellValue>]) -> CoreResult<AppendReport> {
        if rows.is_empty() {
            return Ok(AppendReport::default());
        }
        self.insert_absent(rows).map_err(to_store_error)
    }

    fn list_collections(&self) -> CoreResult<Vec<String>> {
        self.collections().map_err(to_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::domain::CANONICAL_COLUMNS;

    fn store() -> DuckDbStore {
        DuckDbStore::open_in_memory("Data").unwrap()
    }

    fn cells(id: &str) -> Vec<CellValue> {
        let mut row = vec![CellValue::Blank; CANONICAL_COLUMNS.len()];
        row[ID_COLUMN] = CellValue::Text(id.to_string());
        row[4] = CellValue::LiteralText("04/08/2025".to_string());
        row[7] = CellValue::Integer(2025);
        row[9] = CellValue::Number(Decimal::new(45000, 2));
        row
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = store();
        assert_eq!(store.ensure_schema(&CANONICAL_COLUMNS).unwrap(), SchemaStatus::Created);
        assert_eq!(store.ensure_schema(&CANONICAL_COLUMNS).unwrap(), SchemaStatus::AlreadyPresent);
    }

    #[test]
    fn test_ensure_schema_detects_header_mismatch() {
        let store = store();
        store.ensure_schema(&["id", "plateforme"]).unwrap();
        let err = store.ensure_schema(&CANONICAL_COLUMNS).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_list_identifiers_on_missing_table_is_empty() {
        assert!(store().list_identifiers().unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order_and_text() {
        let store = store();
        store.ensure_schema(&CANONICAL_COLUMNS).unwrap();
        assert_eq!(store.append_rows(&[cells("B"), cells("A")]).unwrap().written, 2);
        assert_eq!(store.append_rows(&[cells("C")]).unwrap().written, 1);

        let rows = store.read_rows().unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r[0].clone().unwrap()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert_eq!(rows[0][4].as_deref(), Some("04/08/2025"));
        assert_eq!(rows[0][7].as_deref(), Some("2025"));
        assert_eq!(rows[0][9].as_deref(), Some("450"));
        assert_eq!(rows[0][10], None);
    }

    #[test]
    fn test_append_skips_ids_already_stored() {
        let store = store();
        store.ensure_schema(&CANONICAL_COLUMNS).unwrap();
        store.append_rows(&[cells("A")]).unwrap();

        let report = store.append_rows(&[cells("A"), cells("B")]).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.already_present, vec!["A".to_string()]);
        assert_eq!(store.row_count().unwrap(), 2);
        let ids = store.list_identifiers().unwrap();
        assert!(ids.contains("A") && ids.contains("B"));
    }

    #[test]
    fn test_append_keeps_repeats_within_one_call() {
        let store = store();
        store.ensure_schema(&CANONICAL_COLUMNS).unwrap();
        assert_eq!(store.append_rows(&[cells("A"), cells("A")]).unwrap().written, 2);
    }

    #[test]
    fn test_append_without_schema_is_store_error() {
        let err = store().append_rows(&[cells("A")]).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn test_list_collections_excludes_canonical() {
        let store = store();
        store.ensure_schema(&CANONICAL_COLUMNS).unwrap();
        store.create_collection("25% La Jungle - Plérin", &["date", "montant"]).unwrap();
        store.create_collection("Studio Cosy", &["date"]).unwrap();

        assert_eq!(
            store.list_collections().unwrap(),
            vec!["25% La Jungle - Plérin".to_string(), "Studio Cosy".to_string()]
        );
    }

    #[test]
    fn test_retryable_error_detection() {
        assert!(is_retryable_error("IO Error: Could not set lock on file"));
        assert!(is_retryable_error("The process cannot access the file"));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }
}
