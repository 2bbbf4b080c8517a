//! Service layer - business logic orchestration
//!
//! The parsing stages (fields, listing, detect, mapper, merge) are pure
//! functions; `ImportService` strings them together against a store gateway.

pub mod collections;
pub mod detect;
pub mod fields;
pub mod import;
pub mod listing;
pub mod logging;
pub mod mapper;
pub mod merge;

pub use collections::{CollectionInfo, CollectionsService};
pub use detect::{detect_format, parse_upload, ParsedUpload, RawRecord};
pub use fields::{parse_amount, parse_local_date, DateShape, MonthLocale};
pub use import::{upload_digest, ImportService};
pub use listing::{extract_commission_rate, normalize_listing};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use mapper::{MappedBatch, MapperOptions, RowMapper};
pub use merge::{dedupe_within_batch, merge, MergePlan};
