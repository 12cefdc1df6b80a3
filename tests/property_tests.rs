use coverage_api::{
    models::{RawRow, ZoneKind},
    services::{
        normalizer::{self, ColumnSet},
        series::parse_window_size,
    },
};
use proptest::prelude::*;

fn rows_strategy() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((0.0f64..10_000.0, 0.0f64..10_000.0, 0.0f64..10_000.0), 1..20)
}

fn to_rows(values: &[(f64, f64, f64)]) -> Vec<RawRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, (p, r, s))| RawRow::new(format!("Z{i}"), *p, *r).with_supplementary(*s))
        .collect()
}

proptest! {
    #[test]
    fn shares_sum_to_one_hundred_when_totals_are_positive(values in rows_strategy()) {
        let entries = normalizer::normalize(&to_rows(&values), ColumnSet::from(ZoneKind::Zone1.profile()))
            .unwrap();
        prop_assert_eq!(entries.len(), values.len());

        let planned_total: f64 = values.iter().map(|v| v.0).sum();
        let planned_sum: f64 = entries.iter().map(|e| e.planned_share_pct).sum();
        if planned_total > 0.0 {
            prop_assert!((planned_sum - 100.0).abs() <= 100.0 * 1e-9);
        } else {
            prop_assert_eq!(planned_sum, 0.0);
        }

        let supplementary_total: f64 = values.iter().map(|v| v.2).sum();
        let supplementary_sum: f64 = entries
            .iter()
            .filter_map(|e| e.supplementary_share_pct)
            .sum();
        if supplementary_total > 0.0 {
            prop_assert!((supplementary_sum - 100.0).abs() <= 100.0 * 1e-9);
        }
        for entry in &entries {
            prop_assert!(entry.planned_share_pct >= 0.0 && entry.planned_share_pct <= 100.0 + 1e-9);
        }
    }

    #[test]
    fn zero_totals_give_zero_shares(len in 1usize..10) {
        let values = vec![(0.0, 0.0, 0.0); len];
        let entries = normalizer::normalize(&to_rows(&values), ColumnSet::from(ZoneKind::Zone2.profile()))
            .unwrap();
        for entry in entries {
            prop_assert_eq!(entry.planned_share_pct, 0.0);
            prop_assert_eq!(entry.realized_share_pct, 0.0);
            prop_assert_eq!(entry.supplementary_share_pct, None);
        }
    }

    #[test]
    fn renormalizing_fresh_entries_changes_nothing(values in rows_strategy()) {
        let entries = normalizer::normalize(&to_rows(&values), ColumnSet::from(ZoneKind::Zone1.profile()))
            .unwrap();
        let mut again = entries.clone();
        normalizer::renormalize(&mut again);
        prop_assert_eq!(entries, again);
    }

    #[test]
    fn window_sizes_parse_only_positive_integers(n in 1u32..=u32::MAX) {
        let raw = n.to_string();
        prop_assert_eq!(
            parse_window_size(Some(raw.as_str())).unwrap(),
            n
        );
        let suffixed = format!("{n}x");
        prop_assert!(parse_window_size(Some(suffixed.as_str())).is_err());
    }
}

#[test]
fn window_size_bounds() {
    assert_eq!(parse_window_size(Some("4294967295")).unwrap(), u32::MAX);
    assert!(parse_window_size(Some("4294967296")).is_err());
    assert!(parse_window_size(Some("0")).is_err());
    assert!(parse_window_size(Some("-1")).is_err());
}
