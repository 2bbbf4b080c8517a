//! Format detection - classify an upload by its header row
//!
//! Detection relies only on which columns are present, never on the file name
//! or cell contents. Once the format is known every record is deserialized into
//! that platform's row type, so mapping never re-checks the format per field.

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;

use crate::domain::result::{Error, Result};
use crate::domain::Platform;

/// Header variants accepted for each canonical field key
type ColumnAliases = &'static [(&'static str, &'static [&'static str])];

const AIRBNB_COLUMNS: ColumnAliases = &[
    ("confirmation_code", &["Code de confirmation", "Confirmation code"]),
    ("start_date", &["Date de début", "Start date"]),
    ("end_date", &["Date de fin", "End date"]),
    ("guest", &["Voyageur", "Guest"]),
    ("listing", &["Logement", "Listing"]),
    ("amount", &["Montant", "Amount"]),
    ("gross_earnings", &["Revenus bruts", "Gross earnings"]),
];

const BOOKING_COLUMNS: ColumnAliases = &[
    ("reference", &["Numéro de réservation", "Reservation number", "Book number"]),
    ("check_in", &["Arrivée", "Check-in"]),
    ("check_out", &["Départ", "Check-out"]),
    ("guest", &["Nom du client", "Guest name(s)", "Guest name"]),
    ("price", &["Prix", "Tarif", "Price"]),
];

/// One Airbnb export row, keyed by canonical field names
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirbnbRow {
    #[serde(default)]
    pub confirmation_code: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub guest: Option<String>,
    #[serde(default)]
    pub listing: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub gross_earnings: Option<String>,
}

/// One Booking export row. The format has no per-row property column.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookingRow {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub guest: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// A raw record, shaped by the format detected for its upload
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Airbnb(AirbnbRow),
    Booking(BookingRow),
}

/// CSV content split into its header row and data records
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    /// Header cells, trimmed and without a byte-order mark
    pub headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl ParsedUpload {
    /// Number of data records (header excluded)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Deserialize every record into the row type of `format`
    pub fn into_records(self, format: Platform) -> Result<Vec<RawRecord>> {
        let columns = match format {
            Platform::Airbnb => AIRBNB_COLUMNS,
            Platform::Booking => BOOKING_COLUMNS,
        };
        let keyed = StringRecord::from(canonical_headers(&self.headers, columns));

        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let raw = match format {
                    Platform::Airbnb => record.deserialize(Some(&keyed)).map(RawRecord::Airbnb),
                    Platform::Booking => record.deserialize(Some(&keyed)).map(RawRecord::Booking),
                };
                raw.map_err(|e| {
                    Error::malformed(format!("Erreur de lecture du CSV (ligne {}) : {}", idx + 1, e))
                })
            })
            .collect()
    }
}

/// Parse CSV bytes. Any structural problem rejects the whole upload.
pub fn parse_upload(bytes: &[u8]) -> Result<ParsedUpload> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(clean_header)
        .collect();

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    Ok(ParsedUpload { headers, records })
}

fn csv_error(err: csv::Error) -> Error {
    Error::malformed(format!("Erreur de lecture du CSV : {}", err))
}

fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

/// Classify an upload from the headers of its first record
pub fn detect_format(headers: &[String]) -> Result<Platform> {
    if has_column(headers, AIRBNB_COLUMNS, "confirmation_code") {
        Ok(Platform::Airbnb)
    } else if has_column(headers, BOOKING_COLUMNS, "reference") {
        Ok(Platform::Booking)
    } else {
        Err(Error::UnrecognizedFormat {
            headers: headers.to_vec(),
        })
    }
}

fn aliases_for(columns: ColumnAliases, key: &str) -> &'static [&'static str] {
    columns
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

fn matches_alias(header: &str, aliases: &[&str]) -> bool {
    let header = header.to_lowercase();
    aliases.iter().any(|a| a.to_lowercase() == header)
}

fn has_column(headers: &[String], columns: ColumnAliases, key: &str) -> bool {
    let aliases = aliases_for(columns, key);
    headers.iter().any(|h| matches_alias(h, aliases))
}

/// Rename recognized headers to their field key. Unknown headers pass through
/// unchanged; a key already claimed by an earlier column is not reassigned.
fn canonical_headers(headers: &[String], columns: ColumnAliases) -> Vec<String> {
    let mut claimed: Vec<&str> = Vec::new();
    headers
        .iter()
        .map(|header| {
            let key = columns
                .iter()
                .find(|(key, aliases)| !claimed.contains(key) && matches_alias(header, aliases))
                .map(|(key, _)| *key);
            match key {
                Some(key) => {
                    claimed.push(key);
                    key.to_string()
                }
                None => header.clone(),
            }
        })
        .collect()
}
