//! Row mapper - raw platform records to canonical booking rows

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{CanonicalBookingRecord, Platform, SkipReason, SkippedRecord, UNKNOWN_LISTING};
use crate::services::detect::{AirbnbRow, BookingRow, RawRecord};
use crate::services::fields::{month_name, parse_amount, parse_local_date, DateShape, MonthLocale};
use crate::services::listing::{normalize_listing, strip_diacritics};

/// Mapping settings taken from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperOptions {
    pub locale: MonthLocale,
    /// Remove accents from the normalized listing name
    pub strip_diacritics: bool,
}

/// Canonical rows in input order, plus the records that were dropped
#[derive(Debug, Clone, Default)]
pub struct MappedBatch {
    pub rows: Vec<CanonicalBookingRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Maps raw records of one upload to [`CanonicalBookingRecord`]s
pub struct RowMapper {
    options: MapperOptions,
    imported_on: NaiveDate,
    listing_hint: Option<String>,
}

impl RowMapper {
    pub fn new(imported_on: NaiveDate, options: MapperOptions) -> Self {
        Self {
            options,
            imported_on,
            listing_hint: None,
        }
    }

    /// Listing label for formats that carry none per row (Booking)
    pub fn with_listing_hint(mut self, hint: Option<String>) -> Self {
        self.listing_hint = hint;
        self
    }

    /// Map every record. Records missing a required field are skipped and
    /// reported, never turned into errors.
    pub fn map(&self, records: &[RawRecord]) -> MappedBatch {
        let mut batch = MappedBatch::default();

        for (idx, record) in records.iter().enumerate() {
            let mapped = match record {
                RawRecord::Airbnb(row) => self.map_airbnb(row),
                RawRecord::Booking(row) => self.map_booking(row),
            };
            match mapped {
                Ok(row) => batch.rows.push(row),
                Err(reason) => batch.skipped.push(SkippedRecord {
                    line: idx + 1,
                    reason,
                }),
            }
        }

        batch
    }

    fn map_airbnb(&self, row: &AirbnbRow) -> Result<CanonicalBookingRecord, SkipReason> {
        let start_text = present(&row.start_date).ok_or(SkipReason::MissingStartDate)?;
        let guest = present(&row.guest).ok_or(SkipReason::MissingGuestName)?;
        let id = present(&row.confirmation_code).ok_or(SkipReason::MissingIdentifier)?;
        let start_date = parse_local_date(start_text, DateShape::MonthDayYear)
            .ok_or(SkipReason::InvalidStartDate)?;
        let end_date = present(&row.end_date)
            .and_then(|text| parse_local_date(text, DateShape::MonthDayYear));

        let raw_label = row
            .listing
            .clone()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LISTING.to_string());

        // Payout column first, gross earnings when the payout cell is empty
        let gross_text = present(&row.amount).or_else(|| present(&row.gross_earnings));

        Ok(self.build(
            id,
            Platform::Airbnb,
            raw_label,
            start_date,
            end_date,
            guest,
            gross_text,
        ))
    }

    fn map_booking(&self, row: &BookingRow) -> Result<CanonicalBookingRecord, SkipReason> {
        let start_text = present(&row.check_in).ok_or(SkipReason::MissingStartDate)?;
        let guest = present(&row.guest).ok_or(SkipReason::MissingGuestName)?;
        let id = present(&row.reference).ok_or(SkipReason::MissingIdentifier)?;
        let start_date = parse_local_date(start_text, DateShape::HumanReadable)
            .ok_or(SkipReason::InvalidStartDate)?;
        let end_date = present(&row.check_out)
            .and_then(|text| parse_local_date(text, DateShape::HumanReadable));

        let raw_label = self
            .listing_hint
            .clone()
            .filter(|hint| !hint.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LISTING.to_string());

        Ok(self.build(
            id,
            Platform::Booking,
            raw_label,
            start_date,
            end_date,
            guest,
            present(&row.price),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        id: &str,
        platform: Platform,
        raw_label: String,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        guest: &str,
        gross_text: Option<&str>,
    ) -> CanonicalBookingRecord {
        // Refund or adjustment lines can carry negative payouts; gross income stays >= 0
        let gross_income = gross_text
            .map(parse_amount)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);

        CanonicalBookingRecord {
            id: id.to_string(),
            platform,
            listing_name: self.display_name(&raw_label),
            raw_listing_label: raw_label,
            start_date,
            end_date,
            month: month_name(start_date, self.options.locale),
            year: start_date.year(),
            guest_name: guest.to_string(),
            gross_income,
            cleaning_fee: None,
            commission_rate: None,
            commission: None,
            imported_on: self.imported_on,
        }
    }

    fn display_name(&self, raw_label: &str) -> String {
        let name = normalize_listing(raw_label);
        if self.options.strip_diacritics {
            strip_diacritics(&name)
        } else {
            name
        }
    }
}

/// Trimmed cell text, `None` when absent or blank
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    fn airbnb(code: &str, start: &str, guest: &str) -> RawRecord {
        RawRecord::Airbnb(AirbnbRow {
            confirmation_code: Some(code.to_string()),
            start_date: Some(start.to_string()),
            end_date: Some("08/09/2025".to_string()),
            guest: Some(guest.to_string()),
            listing: Some("La Jungle – À Deux Pas de la Mer".to_string()),
            amount: Some("450,00 €".to_string()),
            gross_earnings: None,
        })
    }

    fn booking(reference: &str, check_in: &str) -> RawRecord {
        RawRecord::Booking(BookingRow {
            reference: Some(reference.to_string()),
            check_in: Some(check_in.to_string()),
            check_out: None,
            guest: Some("Bob Martin".to_string()),
            price: Some("312.40 EUR".to_string()),
        })
    }

    #[test]
    fn test_map_airbnb_row() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let batch = mapper.map(&[airbnb(" HM1 ", "08/04/2025", "Alice")]);

        assert!(batch.skipped.is_empty());
        let row = &batch.rows[0];
        assert_eq!(row.id, "HM1");
        assert_eq!(row.platform, Platform::Airbnb);
        assert_eq!(row.raw_listing_label, "La Jungle – À Deux Pas de la Mer");
        assert_eq!(row.listing_name, "La Jungle");
        assert_eq!(row.start_date, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(row.end_date, NaiveDate::from_ymd_opt(2025, 8, 9));
        assert_eq!(row.month, "août");
        assert_eq!(row.year, 2025);
        assert_eq!(row.guest_name, "Alice");
        assert_eq!(row.gross_income, Decimal::new(45000, 2));
        assert_eq!(row.imported_on, import_day());
    }

    #[test]
    fn test_commission_fields_stay_blank() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let mut record = airbnb("HM1", "08/04/2025", "Alice");
        if let RawRecord::Airbnb(row) = &mut record {
            row.listing = Some("25% La Jungle - Plérin".to_string());
        }
        let row = &mapper.map(&[record]).rows[0];
        assert_eq!(row.cleaning_fee, None);
        assert_eq!(row.commission_rate, None);
        assert_eq!(row.commission, None);
    }

    #[test]
    fn test_airbnb_falls_back_to_gross_earnings() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let record = RawRecord::Airbnb(AirbnbRow {
            confirmation_code: Some("HM9".to_string()),
            start_date: Some("08/04/2025".to_string()),
            guest: Some("Alice".to_string()),
            gross_earnings: Some("1.234,56 €".to_string()),
            ..Default::default()
        });
        let row = &mapper.map(&[record]).rows[0];
        assert_eq!(row.gross_income, Decimal::new(123456, 2));
        assert_eq!(row.raw_listing_label, UNKNOWN_LISTING);
        assert_eq!(row.listing_name, UNKNOWN_LISTING);
        assert_eq!(row.end_date, None);
    }

    #[test]
    fn test_unparseable_amount_is_zero() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let mut record = airbnb("HM1", "08/04/2025", "Alice");
        if let RawRecord::Airbnb(row) = &mut record {
            row.amount = Some("gratuit".to_string());
        }
        assert_eq!(mapper.map(&[record]).rows[0].gross_income, Decimal::ZERO);
    }

    #[test]
    fn test_skips_missing_required_fields() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let records = vec![
            airbnb("HM1", "", "Alice"),
            airbnb("HM2", "08/04/2025", "  "),
            airbnb("", "08/04/2025", "Carol"),
            airbnb("HM4", "not a date", "Dan"),
            airbnb("HM5", "08/05/2025", "Eve"),
        ];
        let batch = mapper.map(&records);

        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].id, "HM5");
        assert_eq!(
            batch.skipped,
            vec![
                SkippedRecord { line: 1, reason: SkipReason::MissingStartDate },
                SkippedRecord { line: 2, reason: SkipReason::MissingGuestName },
                SkippedRecord { line: 3, reason: SkipReason::MissingIdentifier },
                SkippedRecord { line: 4, reason: SkipReason::InvalidStartDate },
            ]
        );
    }

    #[test]
    fn test_booking_uses_listing_hint() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default())
            .with_listing_hint(Some("25% Ty Koz - Perros-Guirec".to_string()));
        let batch = mapper.map(&[booking("4242", "4 Aug 2025")]);

        let row = &batch.rows[0];
        assert_eq!(row.platform, Platform::Booking);
        assert_eq!(row.raw_listing_label, "25% Ty Koz - Perros-Guirec");
        assert_eq!(row.listing_name, "Ty Koz");
        assert_eq!(row.start_date, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(row.end_date, None);
        assert_eq!(row.gross_income, Decimal::new(31240, 2));
    }

    #[test]
    fn test_booking_without_hint_is_unknown() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let row = &mapper.map(&[booking("4242", "4 août 2025")]).rows[0];
        assert_eq!(row.raw_listing_label, UNKNOWN_LISTING);
    }

    #[test]
    fn test_strip_diacritics_option() {
        let options = MapperOptions {
            strip_diacritics: true,
            ..Default::default()
        };
        let mapper = RowMapper::new(import_day(), options)
            .with_listing_hint(Some("Gîte de l'Écluse - Plérin".to_string()));
        let row = &mapper.map(&[booking("1", "2025-08-04")]).rows[0];
        assert_eq!(row.listing_name, "Gite de l'Ecluse");
        assert_eq!(row.raw_listing_label, "Gîte de l'Écluse - Plérin");
    }

    #[test]
    fn test_negative_payout_clamped_to_zero() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let mut record = airbnb("HM1", "08/04/2025", "Alice");
        if let RawRecord::Airbnb(row) = &mut record {
            row.amount = Some("-35,00 €".to_string());
        }
        assert_eq!(mapper.map(&[record]).rows[0].gross_income, Decimal::ZERO);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = RowMapper::new(import_day(), MapperOptions::default());
        let records = vec![airbnb("HM1", "08/04/2025", "Alice"), airbnb("HM2", "08/06/2025", "Bob")];
        assert_eq!(mapper.map(&records).rows, mapper.map(&records).rows);
    }
}
