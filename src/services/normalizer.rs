//! Share computation for coverage rows.
//!
//! Every count column is totalled independently; a row's share of a column
//! is `count / total * 100`, or `0` when the total is not positive.

use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{RawRow, ZoneEntry, ZoneProfile};

/// Which count columns are required for a given zone kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnSet {
    pub supplementary: bool,
}

impl From<ZoneProfile> for ColumnSet {
    fn from(profile: ZoneProfile) -> Self {
        Self {
            supplementary: profile.supplementary_column,
        }
    }
}

#[inline]
pub fn share_pct(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

fn required(row_index: usize, name: &str, value: Option<f64>) -> Result<f64, ServiceError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ServiceError::ValidationError(format!(
            "row {}: {} must be a finite number",
            row_index, name
        ))),
        None => Err(ServiceError::ValidationError(format!(
            "row {}: missing {}",
            row_index, name
        ))),
    }
}

/// Turns raw rows into entries with derived shares. Fails without partial
/// output when any row lacks a zone label or a required count.
pub fn normalize(rows: &[RawRow], columns: ColumnSet) -> Result<Vec<ZoneEntry>, ServiceError> {
    struct Counts<'a> {
        zone: &'a str,
        planned: f64,
        realized: f64,
        supplementary: Option<f64>,
    }

    let mut checked = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let zone = row.zone.trim();
        if zone.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "row {}: zone must not be empty",
                index
            )));
        }
        let supplementary = if columns.supplementary {
            Some(required(index, "couvSupp", row.supplementary)?)
        } else {
            None
        };
        checked.push(Counts {
            zone,
            planned: required(index, "couvPrev", row.planned)?,
            realized: required(index, "couvReal", row.realized)?,
            supplementary,
        });
    }

    let planned_total: f64 = checked.iter().map(|c| c.planned).sum();
    let realized_total: f64 = checked.iter().map(|c| c.realized).sum();
    let supplementary_total: f64 = checked.iter().filter_map(|c| c.supplementary).sum();

    Ok(checked
        .into_iter()
        .map(|c| ZoneEntry {
            id: Uuid::new_v4(),
            zone: c.zone.to_string(),
            planned_count: c.planned,
            realized_count: c.realized,
            supplementary_count: c.supplementary,
            planned_share_pct: share_pct(c.planned, planned_total),
            realized_share_pct: share_pct(c.realized, realized_total),
            supplementary_share_pct: c.supplementary.map(|v| share_pct(v, supplementary_total)),
        })
        .collect())
}

/// Re-derives every share from the counts already stored on the entries.
/// Entries without a supplementary count keep no supplementary share.
pub fn renormalize(entries: &mut [ZoneEntry]) {
    let planned_total: f64 = entries.iter().map(|e| e.planned_count).sum();
    let realized_total: f64 = entries.iter().map(|e| e.realized_count).sum();
    let supplementary_total: f64 = entries.iter().filter_map(|e| e.supplementary_count).sum();

    for entry in entries.iter_mut() {
        entry.planned_share_pct = share_pct(entry.planned_count, planned_total);
        entry.realized_share_pct = share_pct(entry.realized_count, realized_total);
        entry.supplementary_share_pct = entry
            .supplementary_count
            .map(|v| share_pct(v, supplementary_total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn computes_shares_per_column() {
        let rows = vec![RawRow::new("A", 10.0, 8.0), RawRow::new("B", 30.0, 12.0)];
        let entries = normalize(&rows, ColumnSet::default()).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(approx(entries[0].planned_share_pct, 25.0));
        assert!(approx(entries[0].realized_share_pct, 40.0));
        assert!(approx(entries[1].planned_share_pct, 75.0));
        assert!(approx(entries[1].realized_share_pct, 60.0));
        assert_eq!(entries[0].supplementary_share_pct, None);
    }

    #[test]
    fn zero_total_in_one_column_does_not_affect_another() {
        let rows = vec![RawRow::new("A", 0.0, 5.0), RawRow::new("B", 0.0, 15.0)];
        let entries = normalize(&rows, ColumnSet::default()).unwrap();

        assert!(entries.iter().all(|e| e.planned_share_pct == 0.0));
        assert!(approx(entries[0].realized_share_pct, 25.0));
        assert!(approx(entries[1].realized_share_pct, 75.0));
    }

    #[test]
    fn supplementary_column_is_normalized_when_enabled() {
        let rows = vec![
            RawRow::new("A", 1.0, 1.0).with_supplementary(2.0),
            RawRow::new("B", 1.0, 1.0).with_supplementary(6.0),
        ];
        let entries = normalize(&rows, ColumnSet { supplementary: true }).unwrap();
        assert_eq!(entries[0].supplementary_share_pct, Some(25.0));
        assert_eq!(entries[1].supplementary_share_pct, Some(75.0));
    }

    #[test]
    fn supplementary_counts_are_dropped_when_disabled() {
        let rows = vec![RawRow::new("A", 1.0, 1.0).with_supplementary(2.0)];
        let entries = normalize(&rows, ColumnSet::default()).unwrap();
        assert_eq!(entries[0].supplementary_count, None);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize(&[], ColumnSet::default()).unwrap().is_empty());
    }

    #[rstest]
    #[case::missing_planned(RawRow { planned: None, ..RawRow::new("A", 1.0, 1.0) }, ColumnSet::default())]
    #[case::missing_realized(RawRow { realized: None, ..RawRow::new("A", 1.0, 1.0) }, ColumnSet::default())]
    #[case::missing_supplementary(RawRow::new("A", 1.0, 1.0), ColumnSet { supplementary: true })]
    #[case::blank_zone(RawRow::new("  ", 1.0, 1.0), ColumnSet::default())]
    #[case::nan_count(RawRow::new("A", f64::NAN, 1.0), ColumnSet::default())]
    fn invalid_rows_are_rejected(#[case] bad: RawRow, #[case] columns: ColumnSet) {
        let rows = vec![RawRow::new("ok", 1.0, 1.0).with_supplementary(1.0), bad];
        assert_matches!(
            normalize(&rows, columns),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn negative_counts_are_accepted() {
        let rows = vec![RawRow::new("A", -5.0, 1.0), RawRow::new("B", 15.0, 1.0)];
        let entries = normalize(&rows, ColumnSet::default()).unwrap();
        assert!(approx(entries[0].planned_share_pct, -50.0));
        assert!(approx(entries[1].planned_share_pct, 150.0));
    }

    #[test]
    fn renormalize_rederives_from_counts() {
        let rows = vec![RawRow::new("A", 10.0, 8.0), RawRow::new("B", 30.0, 12.0)];
        let mut entries = normalize(&rows, ColumnSet::default()).unwrap();
        entries[0].planned_count = 30.0;
        renormalize(&mut entries);
        assert!(approx(entries[0].planned_share_pct, 50.0));
        assert!(approx(entries[1].planned_share_pct, 50.0));
        assert!(approx(entries[0].realized_share_pct, 40.0));
    }
}
