use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::models::{PeriodRecord, SeriesWindow, Snapshot, ZoneKind};
use crate::repositories::SnapshotStore;

/// Parses the `weeks` query parameter into a positive window size.
pub fn parse_window_size(raw: Option<&str>) -> Result<u32, ServiceError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ServiceError::InvalidArgument("Zone and weeks are required parameters.".to_string())
        })?;
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ServiceError::InvalidArgument(format!(
            "weeks must be a positive integer, got '{}'",
            raw
        ))),
    }
}

/// Projects each snapshot's entry for `zone` into a numbered period.
/// Snapshots without such an entry are skipped and do not consume a number.
pub fn project_series(zone: &str, snapshots: &[Snapshot]) -> Vec<PeriodRecord> {
    snapshots
        .iter()
        .filter_map(|snapshot| snapshot.entry_for_zone(zone))
        .enumerate()
        .map(|(index, entry)| PeriodRecord {
            week: index + 1,
            planned_count: entry.planned_count,
            realized_count: entry.realized_count,
            planned_share_pct: entry.planned_share_pct,
            realized_share_pct: entry.realized_share_pct,
        })
        .collect()
}

/// Builds a zone's history from the snapshots that mention it.
#[derive(Clone)]
pub struct SeriesExtractor {
    store: Arc<dyn SnapshotStore>,
}

impl SeriesExtractor {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Returns the series oldest first. Having fewer than `min_snapshots`
    /// qualifying snapshots yields an empty series, not an error.
    #[instrument(skip(self))]
    pub async fn extract(
        &self,
        kind: ZoneKind,
        zone: &str,
        window: SeriesWindow,
        min_snapshots: usize,
    ) -> Result<Vec<PeriodRecord>, ServiceError> {
        let zone = zone.trim();
        if zone.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "zone must not be empty".to_string(),
            ));
        }
        if window.size() == 0 {
            return Err(ServiceError::InvalidArgument(
                "window size must be a positive integer".to_string(),
            ));
        }

        let snapshots = self.store.find_containing_zone(kind, zone, window).await?;
        if snapshots.len() < min_snapshots {
            debug!(
                found = snapshots.len(),
                required = min_snapshots,
                "not enough history for series"
            );
            return Ok(Vec::new());
        }

        Ok(project_series(zone, &snapshots))
    }

    /// Uses the window shape and minimum history configured for `kind`.
    pub async fn extract_for_kind(
        &self,
        kind: ZoneKind,
        zone: &str,
        window_size: u32,
    ) -> Result<Vec<PeriodRecord>, ServiceError> {
        let profile = kind.profile();
        self.extract(
            kind,
            zone,
            profile.series_window.with_size(window_size),
            profile.min_series_snapshots,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ZoneEntry;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn snapshot(entries: &[(&str, f64)]) -> Snapshot {
        Snapshot {
            id: Uuid::new_v4(),
            zone_kind: ZoneKind::Zone2,
            entries: entries
                .iter()
                .map(|(zone, planned)| ZoneEntry {
                    id: Uuid::new_v4(),
                    zone: zone.to_string(),
                    planned_count: *planned,
                    realized_count: 0.0,
                    supplementary_count: None,
                    planned_share_pct: 0.0,
                    realized_share_pct: 0.0,
                    supplementary_share_pct: None,
                })
                .collect(),
            planned_days: Vec::new(),
            realized_days: Vec::new(),
            supplementary_days: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn projection_numbers_only_matching_snapshots() {
        let snapshots = vec![
            snapshot(&[("A", 1.0)]),
            snapshot(&[("B", 2.0)]),
            snapshot(&[("B", 3.0), ("A", 4.0)]),
        ];
        let series = project_series("A", &snapshots);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].week, 1);
        assert_eq!(series[0].planned_count, 1.0);
        assert_eq!(series[1].week, 2);
        assert_eq!(series[1].planned_count, 4.0);
    }

    #[rstest]
    #[case(Some("3"), Some(3))]
    #[case(Some(" 12 "), Some(12))]
    #[case(Some("0"), None)]
    #[case(Some("-2"), None)]
    #[case(Some("two"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn window_size_parsing(#[case] raw: Option<&str>, #[case] expected: Option<u32>) {
        match expected {
            Some(n) => assert_eq!(parse_window_size(raw).unwrap(), n),
            None => assert_matches!(
                parse_window_size(raw),
                Err(ServiceError::InvalidArgument(_))
            ),
        }
    }
}
