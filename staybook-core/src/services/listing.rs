//! Listing name normalization
//!
//! Derives a clean property name from noisy labels: sheet titles such as
//! `25% La Jungle - Plérin / Amandie`, free-text CSV columns such as
//! `La Jungle – À Deux Pas de la Mer`, or upload file names.

use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Leading commission token, e.g. `25% ` or `12,5 % `
static PERCENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:[.,]\d+)?)\s*%\s*").expect("valid regex"));

/// A percentage anywhere in a label
static RATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*%").expect("valid regex"));

/// Whitespace, then `-`, `/` or an en-dash, then whitespace
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-/–]\s+").expect("valid regex"));

/// Clean display name for a raw listing label.
///
/// Drops a leading percentage token, truncates at the first separator and
/// trims. A label with no separator is kept whole.
pub fn normalize_listing(raw: &str) -> String {
    let name = PERCENT_PREFIX.replace(raw, "");
    let name = match SEPARATOR.find(&name) {
        Some(m) => &name[..m.start()],
        None => &name[..],
    };
    name.trim().to_string()
}

/// Remove diacritical marks, leaving base Latin characters (`Plérin` -> `Plerin`)
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Commission rate carried by a percentage in the label (`25% ...` or
/// `La Jungle 25%` -> `0.25`). The first percentage wins.
///
/// Informational only: merge never computes commissions from it.
pub fn extract_commission_rate(label: &str) -> Option<Decimal> {
    let caps = RATE.captures(label)?;
    let value = Decimal::from_str(&caps[1].replace(',', ".")).ok()?;
    Some(value / Decimal::ONE_HUNDRED)
}

/// Raw listing label carried by an upload's file name (`La Jungle.csv` -> `La Jungle`)
pub fn listing_hint_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let hint = stem.replace('_', " ");
    let hint = hint.trim();
    if hint.is_empty() {
        None
    } else {
        Some(hint.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sheet_title() {
        assert_eq!(normalize_listing("25% La Jungle - Plérin / Amandie"), "La Jungle");
    }

    #[test]
    fn test_normalize_without_separator_keeps_whole_label() {
        assert_eq!(normalize_listing("Studio Cosy"), "Studio Cosy");
        assert_eq!(normalize_listing("  Studio Cosy  "), "Studio Cosy");
    }

    #[test]
    fn test_normalize_en_dash_separator() {
        assert_eq!(
            normalize_listing("La Jungle – À Deux Pas de la Mer, Plage à 200m"),
            "La Jungle"
        );
    }

    #[test]
    fn test_normalize_slash_separator() {
        assert_eq!(normalize_listing("Villa Iroise / Brest"), "Villa Iroise");
    }

    #[test]
    fn test_hyphen_inside_word_is_not_a_separator() {
        assert_eq!(normalize_listing("Saint-Malo Loft"), "Saint-Malo Loft");
    }

    #[test]
    fn test_percentage_only_stripped_at_start() {
        assert_eq!(normalize_listing("Loft 100% vue mer"), "Loft 100% vue mer");
        assert_eq!(normalize_listing("12,5 % Ty Koz - Perros"), "Ty Koz");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = "20% Maison Bleue - Erquy";
        assert_eq!(normalize_listing(raw), normalize_listing(raw));
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Plérin"), "Plerin");
        assert_eq!(strip_diacritics("À Deux Pas de la Mer"), "A Deux Pas de la Mer");
        assert_eq!(strip_diacritics("Gîte de l'Écluse"), "Gite de l'Ecluse");
    }

    #[test]
    fn test_extract_commission_rate() {
        assert_eq!(extract_commission_rate("25% La Jungle"), Some(Decimal::new(25, 2)));
        assert_eq!(extract_commission_rate("12,5% Ty Koz"), Some(Decimal::new(125, 3)));
        assert_eq!(extract_commission_rate("La Jungle"), None);
    }

    #[test]
    fn test_commission_rate_found_after_the_name() {
        assert_eq!(extract_commission_rate("La Jungle 25%"), Some(Decimal::new(25, 2)));
        assert_eq!(extract_commission_rate("Ty Koz (20 %) - Plérin"), Some(Decimal::new(20, 2)));
        assert_eq!(extract_commission_rate("Studio 3 - 15% / 10%"), Some(Decimal::new(15, 2)));
    }

    #[test]
    fn test_listing_hint_from_file_name() {
        assert_eq!(
            listing_hint_from_file_name("25% La Jungle - Plérin.csv"),
            Some("25% La Jungle - Plérin".to_string())
        );
        assert_eq!(
            listing_hint_from_file_name("/tmp/Studio_Cosy.csv"),
            Some("Studio Cosy".to_string())
        );
        assert_eq!(listing_hint_from_file_name(".csv"), Some(".csv".to_string()));
        assert_eq!(listing_hint_from_file_name(""), None);
    }
}
