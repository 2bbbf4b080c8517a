//! Canonical booking record - the unit appended to the store

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::fields::{format_date_dmy, format_date_iso};

/// Store header, in canonical column order.
///
/// Rows already stored depend on this order; never reorder or rename.
pub const CANONICAL_COLUMNS: [&str; 14] = [
    "id",
    "plateforme",
    "logement_nom_raw",
    "logement",
    "date_debut",
    "date_fin",
    "mois",
    "annee",
    "voyageur",
    "revenus_bruts",
    "frais_menage",
    "commission_taux",
    "commission",
    "date_import",
];

/// Index of the identifier column in [`CANONICAL_COLUMNS`]
pub const ID_COLUMN: usize = 0;

/// Placeholder label when the source carries no property name
pub const UNKNOWN_LISTING: &str = "Inconnu";

/// Source platform of a booking export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Airbnb,
    Booking,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Airbnb => "airbnb",
            Platform::Booking => "booking",
        }
    }

    /// Human-facing name used in upload logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Airbnb => "Airbnb",
            Platform::Booking => "Booking",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of a canonical row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    /// Text the store must keep verbatim (dates), never coerce to a number or date serial
    LiteralText(String),
    Number(Decimal),
    Integer(i64),
    Blank,
}

impl CellValue {
    /// Textual form for stores that keep every cell as text. Blank maps to `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) | CellValue::LiteralText(s) => Some(s.clone()),
            CellValue::Number(d) => Some(d.normalize().to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Blank => None,
        }
    }

    fn from_optional(value: Option<Decimal>) -> Self {
        value.map(CellValue::Number).unwrap_or(CellValue::Blank)
    }
}

/// A booking normalized from either source format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBookingRecord {
    /// Platform reservation/confirmation reference; unique across the whole store
    pub id: String,
    pub platform: Platform,
    /// Unmodified source text identifying the property
    pub raw_listing_label: String,
    pub listing_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Locale month name of `start_date`, lower-case
    pub month: String,
    pub year: i32,
    pub guest_name: String,
    pub gross_income: Decimal,

    // Left blank by current policy; no commission is computed at merge time
    pub cleaning_fee: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub commission: Option<Decimal>,

    /// Date the upload was processed
    pub imported_on: NaiveDate,
}

impl CanonicalBookingRecord {
    /// Cells in [`CANONICAL_COLUMNS`] order
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.id.clone()),
            CellValue::Text(self.platform.as_str().to_string()),
            CellValue::Text(self.raw_listing_label.clone()),
            CellValue::Text(self.listing_name.clone()),
            CellValue::LiteralText(format_date_dmy(self.start_date)),
            self.end_date
                .map(|d| CellValue::LiteralText(format_date_dmy(d)))
                .unwrap_or(CellValue::Blank),
            CellValue::Text(self.month.clone()),
            CellValue::Integer(i64::from(self.year)),
            CellValue::Text(self.guest_name.clone()),
            CellValue::Number(self.gross_income),
            CellValue::from_optional(self.cleaning_fee),
            CellValue::from_optional(self.commission_rate),
            CellValue::from_optional(self.commission),
            CellValue::LiteralText(format_date_iso(self.imported_on)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalBookingRecord {
        CanonicalBookingRecord {
            id: "HMABC123".to_string(),
            platform: Platform::Airbnb,
            raw_listing_label: "La Jungle – À Deux Pas de la Mer".to_string(),
            listing_name: "La Jungle".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            end_date: None,
            month: "août".to_string(),
            year: 2025,
            guest_name: "Marie Dupont".to_string(),
            gross_income: Decimal::new(45000, 2),
            cleaning_fee: None,
            commission_rate: None,
            commission: None,
            imported_on: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_cells_follow_canonical_column_count() {
        let cells = sample().to_cells();
        assert_eq!(cells.len(), CANONICAL_COLUMNS.len());
        assert_eq!(cells[ID_COLUMN], CellValue::Text("HMABC123".to_string()));
    }

    #[test]
    fn test_dates_are_literal_text() {
        let cells = sample().to_cells();
        assert_eq!(cells[4], CellValue::LiteralText("04/08/2025".to_string()));
        assert_eq!(cells[5], CellValue::Blank);
        assert_eq!(cells[13], CellValue::LiteralText("2025-09-01".to_string()));
    }

    #[test]
    fn test_commission_fields_are_blank() {
        let cells = sample().to_cells();
        assert_eq!(cells[10], CellValue::Blank);
        assert_eq!(cells[11], CellValue::Blank);
        assert_eq!(cells[12], CellValue::Blank);
    }

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(CellValue::Number(Decimal::new(45000, 2)).as_text(), Some("450".to_string()));
        assert_eq!(CellValue::Integer(2025).as_text(), Some("2025".to_string()));
        assert_eq!(CellValue::Blank.as_text(), None);
    }
}
