//! Dedup merge engine
//!
//! Read-then-decide: rows are classified against a snapshot of the stored
//! identifiers. The snapshot is never mutated, and rows are not compared with
//! each other unless [`dedupe_within_batch`] is applied first.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::CanonicalBookingRecord;

/// Rows to append, in input order, and the ids already stored
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergePlan {
    pub to_append: Vec<CanonicalBookingRecord>,
    pub duplicates: Vec<String>,
}

/// Split `new_rows` into rows to append and duplicates of `existing_ids`
pub fn merge(new_rows: Vec<CanonicalBookingRecord>, existing_ids: &HashSet<String>) -> MergePlan {
    let mut plan = MergePlan::default();

    for row in new_rows {
        let id = row.id.trim();
        if existing_ids.contains(id) {
            plan.duplicates.push(id.to_string());
        } else {
            plan.to_append.push(row);
        }
    }

    plan
}

/// Keep the first occurrence of each id. Returns the kept rows and the
/// repeated ids, both in input order.
pub fn dedupe_within_batch(
    rows: Vec<CanonicalBookingRecord>,
) -> (Vec<CanonicalBookingRecord>, Vec<String>) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    let mut repeated = Vec::new();

    for row in rows {
        let id = row.id.trim().to_string();
        if seen.insert(id.clone()) {
            kept.push(row);
        } else {
            repeated.push(id);
        }
    }

    (kept, repeated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::domain::Platform;

    fn row(id: &str) -> CanonicalBookingRecord {
        let day = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        CanonicalBookingRecord {
            id: id.to_string(),
            platform: Platform::Airbnb,
            raw_listing_label: "La Jungle".to_string(),
            listing_name: "La Jungle".to_string(),
            start_date: day,
            end_date: None,
            month: "août".to_string(),
            year: 2025,
            guest_name: "Guest".to_string(),
            gross_income: Decimal::ZERO,
            cleaning_fee: None,
            commission_rate: None,
            commission: None,
            imported_on: day,
        }
    }

    fn ids(rows: &[CanonicalBookingRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn existing(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_into_empty_store() {
        let plan = merge(vec![row("A"), row("B")], &HashSet::new());
        assert_eq!(ids(&plan.to_append), vec!["A", "B"]);
        assert!(plan.duplicates.is_empty());
    }

    #[test]
    fn test_merge_excludes_existing_and_preserves_order() {
        let plan = merge(vec![row("C"), row("A"), row("D"), row("B")], &existing(&["A", "B"]));
        assert_eq!(ids(&plan.to_append), vec!["C", "D"]);
        assert_eq!(plan.duplicates, vec!["A", "B"]);
    }

    #[test]
    fn test_merge_trims_ids() {
        let plan = merge(vec![row(" A ")], &existing(&["A"]));
        assert!(plan.to_append.is_empty());
        assert_eq!(plan.duplicates, vec!["A"]);
    }

    #[test]
    fn test_merge_does_not_dedupe_within_batch() {
        let plan = merge(vec![row("A"), row("A")], &HashSet::new());
        assert_eq!(ids(&plan.to_append), vec!["A", "A"]);
    }

    #[test]
    fn test_merge_leaves_snapshot_untouched() {
        let snapshot = existing(&["A"]);
        let before = snapshot.clone();
        merge(vec![row("B")], &snapshot);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_dedupe_within_batch_keeps_first() {
        let (kept, repeated) = dedupe_within_batch(vec![row("A"), row("B"), row("A "), row("C")]);
        assert_eq!(ids(&kept), vec!["A", "B", "C"]);
        assert_eq!(repeated, vec!["A"]);
    }
}
