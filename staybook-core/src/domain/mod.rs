//! Core domain entities
//!
//! Pure data structures shared by every layer - no I/O here.

mod booking;
pub mod result;
mod upload;

pub use booking::{
    CanonicalBookingRecord, CellValue, Platform, CANONICAL_COLUMNS, ID_COLUMN, UNKNOWN_LISTING,
};
pub use upload::{SkipReason, SkippedRecord, Upload, UploadSummary};
