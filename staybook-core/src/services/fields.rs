//! Field parsers - localized amounts, dates and month names

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Locale used for derived display fields (month names)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthLocale {
    #[default]
    Fr,
    En,
}

impl MonthLocale {
    fn chrono_locale(&self) -> chrono::Locale {
        match self {
            MonthLocale::Fr => chrono::Locale::fr_FR,
            MonthLocale::En => chrono::Locale::en_US,
        }
    }
}

/// Shape of a date column in a source export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `MM/DD/YYYY` slash-delimited triple
    MonthDayYear,
    /// Human text such as `4 Aug 2025`, `4 août 2025` or `2025-08-04`
    HumanReadable,
}

/// Parse a localized currency amount.
///
/// Keeps digits, `,`, `.` and `-`. A comma is a decimal separator; when both
/// separators appear the last one is the decimal point and the other is
/// grouping. Anything unparseable yields zero.
pub fn parse_amount(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    let negative = cleaned.starts_with('-');
    let unsigned: String = cleaned.chars().filter(|c| *c != '-').collect();

    let decimal_sep = unsigned.rfind(|c: char| c == ',' || c == '.');
    let normalized: String = match decimal_sep {
        Some(pos) => unsigned
            .char_indices()
            .filter_map(|(i, c)| match c {
                ',' | '.' if i == pos => Some('.'),
                ',' | '.' => None,
                _ => Some(c),
            })
            .collect(),
        None => unsigned,
    };

    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return Decimal::ZERO;
    }

    match Decimal::from_str(&normalized) {
        Ok(amount) if negative => -amount,
        Ok(amount) => amount,
        Err(_) => Decimal::ZERO,
    }
}

/// Parse a date in the given shape. Malformed input yields `None`.
pub fn parse_local_date(text: &str, shape: DateShape) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match shape {
        DateShape::MonthDayYear => parse_month_day_year(text),
        DateShape::HumanReadable => parse_human_date(text),
    }
}

fn parse_month_day_year(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

const HUMAN_FORMATS: &[&str] = &[
    "%d %b %Y",  // 4 Aug 2025
    "%d %B %Y",  // 4 August 2025
    "%b %d %Y",  // Aug 4 2025
    "%B %d %Y",  // August 4 2025
    "%Y-%m-%d",  // 2025-08-04
];

fn parse_human_date(text: &str) -> Option<NaiveDate> {
    let normalized = to_english_month_tokens(text);
    HUMAN_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

/// Lower-cases, drops weekday names and punctuation, and rewrites French month
/// names to their English abbreviation so chrono's `%b`/`%B` can read them.
fn to_english_month_tokens(text: &str) -> String {
    text.to_lowercase()
        .replace(',', " ")
        .split_whitespace()
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| !is_weekday(token))
        .map(|token| french_month(token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn french_month(token: &str) -> Option<&'static str> {
    let month = match token {
        "janvier" | "janv" => "jan",
        "février" | "fevrier" | "févr" | "fevr" | "fév" => "feb",
        "mars" => "mar",
        "avril" | "avr" => "apr",
        "mai" => "may",
        "juin" => "jun",
        "juillet" | "juil" => "jul",
        "août" | "aout" => "aug",
        "septembre" | "sept" => "sep",
        "octobre" => "oct",
        "novembre" => "nov",
        "décembre" | "decembre" | "déc" => "dec",
        _ => return None,
    };
    Some(month)
}

fn is_weekday(token: &str) -> bool {
    matches!(
        token,
        "lundi" | "lun" | "mardi" | "mercredi" | "mer" | "jeudi" | "jeu"
            | "vendredi" | "ven" | "samedi" | "sam" | "dimanche" | "dim"
            | "monday" | "mon" | "tuesday" | "tue" | "wednesday" | "wed" | "thursday"
            | "thu" | "friday" | "fri" | "saturday" | "sat" | "sunday" | "sun"
    )
}

/// Zero-padded `DD/MM/YYYY`
pub fn format_date_dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `YYYY-MM-DD`
pub fn format_date_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Full month name in the given locale, lower-case
pub fn month_name(date: NaiveDate, locale: MonthLocale) -> String {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    midnight
        .format_localized("%B", locale.chrono_locale())
        .to_string()
        .to_lowercase()
}
