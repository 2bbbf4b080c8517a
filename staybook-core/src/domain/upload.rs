//! Upload input and per-upload report types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::booking::Platform;

/// A single file upload as received from the caller
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Original file name, if known (used to derive the Booking listing hint)
    pub file_name: Option<String>,
    /// Raw file content; `None` means no file was provided
    pub content: Option<Vec<u8>>,
    /// Explicit listing name for formats with no per-row property column
    pub listing_hint: Option<String>,
    /// Processing date stamped on every row; defaults to today
    pub imported_on: Option<NaiveDate>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_listing_hint(mut self, hint: impl Into<String>) -> Self {
        self.listing_hint = Some(hint.into());
        self
    }

    pub fn with_import_date(mut self, date: NaiveDate) -> Self {
        self.imported_on = Some(date);
        self
    }
}

/// Why a raw record was dropped before reaching the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingStartDate,
    MissingGuestName,
    InvalidStartDate,
    MissingIdentifier,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingStartDate => "missing_start_date",
            SkipReason::MissingGuestName => "missing_guest_name",
            SkipReason::InvalidStartDate => "invalid_start_date",
            SkipReason::MissingIdentifier => "missing_identifier",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discarded raw record. `line` is the 1-based data row (header excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub line: usize,
    pub reason: SkipReason,
}

/// What happened during a successful upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Platform>,
    /// Records found in the file (before mapping)
    pub discovered: usize,
    /// Rows actually written to the store
    pub appended: usize,
    /// Identifiers already present in the store
    pub duplicates: Vec<String>,
    /// Identifiers repeated inside the file itself (within-batch dedupe only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeated_in_batch: Vec<String>,
    pub skipped: Vec<SkippedRecord>,
    /// First 16 hex chars of the SHA-256 of the upload bytes
    pub digest: String,
}
