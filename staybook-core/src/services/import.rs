//! Import service - booking CSV upload pipeline
//!
//! One upload runs parse, detect, map, read existing ids, merge and append, in
//! that order. Structural failures abort with the logs gathered so far;
//! per-record problems only show up in the summary.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};

use crate::config::ImportSettings;
use crate::domain::result::{Error, Result, UploadOutcome};
use crate::domain::{CellValue, Upload, UploadSummary, CANONICAL_COLUMNS};
use crate::ports::{SchemaStatus, StoreGateway};
use crate::services::detect::{detect_format, parse_upload};
use crate::services::listing::listing_hint_from_file_name;
use crate::services::mapper::RowMapper;
use crate::services::merge::{dedupe_within_batch, merge};

/// Short content fingerprint: first 16 hex chars of the SHA-256
pub fn upload_digest(bytes: &[u8]) -> String {
    let hash = hex::encode(Sha256::digest(bytes));
    hash[..16].to_string()
}

const NO_BOOKING_FOUND: &str = "Aucune réservation trouvée.";
const NOTHING_NEW: &str = "Aucune nouvelle donnée à ajouter.";

fn rows_added_line(count: usize) -> String {
    if count == 1 {
        "1 ligne ajoutée".to_string()
    } else {
        format!("{} lignes ajoutées", count)
    }
}

/// Runs uploads against one store gateway
pub struct ImportService {
    store: Arc<dyn StoreGateway>,
    settings: ImportSettings,
}

impl ImportService {
    pub fn new(store: Arc<dyn StoreGateway>, settings: ImportSettings) -> Self {
        Self { store, settings }
    }

    /// Collection the service writes to
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Process one upload. Never panics on bad input: every failure comes
    /// back as an unsuccessful outcome.
    pub fn upload(&self, upload: Upload) -> UploadOutcome {
        let mut logs = Vec::new();
        match self.run(upload, &mut logs) {
            Ok(summary) => UploadOutcome::ok(logs, summary),
            Err(err) => UploadOutcome::from_error(&err, logs),
        }
    }

    fn run(&self, upload: Upload, logs: &mut Vec<String>) -> Result<UploadSummary> {
        let Upload {
            file_name,
            content,
            listing_hint,
            imported_on,
        } = upload;

        let bytes = content.ok_or_else(|| Error::malformed("Aucun fichier fourni"))?;
        let mut summary = UploadSummary {
            digest: upload_digest(&bytes),
            ..Default::default()
        };

        let parsed = parse_upload(&bytes)?;
        if parsed.is_empty() {
            logs.push(NO_BOOKING_FOUND.to_string());
            return Ok(summary);
        }

        let format = detect_format(&parsed.headers)?;
        summary.format = Some(format);
        summary.discovered = parsed.len();
        logs.push(format!("Format détecté: {}", format.display_name()));

        let records = parsed.into_records(format)?;

        let hint = listing_hint.or_else(|| file_name.as_deref().and_then(listing_hint_from_file_name));
        let imported_on = imported_on.unwrap_or_else(today);
        let batch = RowMapper::new(imported_on, self.settings.mapper_options())
            .with_listing_hint(hint)
            .map(&records);
        summary.skipped = batch.skipped;

        // Nothing survived mapping: same answer as an empty file, and the
        // store is never touched
        if batch.rows.is_empty() {
            logs.clear();
            logs.push(NO_BOOKING_FOUND.to_string());
            return Ok(summary);
        }

        let rows = if self.settings.dedupe_within_batch {
            let (kept, repeated) = dedupe_within_batch(batch.rows);
            for id in &repeated {
                logs.push(format!("Doublon dans le fichier ignoré: {}", id));
            }
            summary.repeated_in_batch = repeated;
            kept
        } else {
            batch.rows
        };

        if self.store.ensure_schema(&CANONICAL_COLUMNS)? == SchemaStatus::Created {
            logs.push(format!("Feuille \"{}\" créée.", self.store.collection()));
        }

        let existing = self.store.list_identifiers()?;
        let plan = merge(rows, &existing);
        for id in &plan.duplicates {
            logs.push(format!("Doublon ignoré: {}", id));
        }
        summary.duplicates = plan.duplicates;

        if plan.to_append.is_empty() {
            logs.push(NOTHING_NEW.to_string());
            return Ok(summary);
        }

        let cells: Vec<Vec<CellValue>> = plan.to_append.iter().map(|r| r.to_cells()).collect();
        let report = self.store.append_rows(&cells)?;

        // Ids stored by a concurrent upload between the read and the append
        for id in &report.already_present {
            logs.push(format!("Doublon ignoré: {}", id));
        }
        summary.duplicates.extend(report.already_present);
        summary.appended = report.written;

        if report.written == 0 {
            logs.push(NOTHING_NEW.to_string());
        } else {
            logs.push(rows_added_line(report.written));
        }

        Ok(summary)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
