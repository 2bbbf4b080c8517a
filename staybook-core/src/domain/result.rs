//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::upload::UploadSummary;

/// Core library error type
///
/// Only structural failures of an upload are errors. Per-record problems
/// (missing fields, duplicates) are reported as data on the upload summary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    MalformedUpload(String),

    #[error("Format CSV non reconnu (colonnes : {})", .headers.join(", "))]
    UnrecognizedFormat { headers: Vec<String> },

    #[error("Stockage indisponible : {0}")]
    StoreUnavailable(String),

    #[error("Schéma de la feuille incompatible (attendu : {}, trouvé : {})", .expected.join(", "), .found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl Error {
    /// Create a malformed upload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedUpload(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Machine-readable error kind, used for event logging
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedUpload(_) => "malformed_upload",
            Error::UnrecognizedFormat { .. } => "unrecognized_format",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of one upload as returned to the caller
///
/// Failures keep every log line accumulated before the abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// [`Error::kind`] of the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<UploadSummary>,
}

impl UploadOutcome {
    /// Create a successful outcome
    pub fn ok(logs: Vec<String>, summary: UploadSummary) -> Self {
        Self {
            success: true,
            logs,
            error: None,
            error_kind: None,
            summary: Some(summary),
        }
    }

    /// Create a failed outcome, keeping the logs gathered so far
    pub fn fail(error: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: false,
            logs,
            error: Some(error.into()),
            error_kind: None,
            summary: None,
        }
    }

    /// Create a failed outcome from a core error
    pub fn from_error(error: &Error, logs: Vec<String>) -> Self {
        Self {
            error_kind: Some(error.kind().to_string()),
            ..Self::fail(error.to_string(), logs)
        }
    }
}
