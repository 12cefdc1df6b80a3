use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::zone::ZoneKind;

/// One row submitted by the client before shares are computed.
///
/// Counts are optional at the wire level so that a missing count surfaces as
/// a validation failure from the normalizer rather than a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default, alias = "region")]
    pub zone: String,
    #[serde(rename = "couvPrev", default)]
    pub planned: Option<f64>,
    #[serde(rename = "couvReal", default)]
    pub realized: Option<f64>,
    #[serde(rename = "couvSupp", default)]
    pub supplementary: Option<f64>,
}

impl RawRow {
    pub fn new(zone: impl Into<String>, planned: f64, realized: f64) -> Self {
        Self {
            zone: zone.into(),
            planned: Some(planned),
            realized: Some(realized),
            supplementary: None,
        }
    }

    pub fn with_supplementary(mut self, supplementary: f64) -> Self {
        self.supplementary = Some(supplementary);
        self
    }
}

/// A zone's normalized measurement inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub zone: String,
    #[serde(rename = "couvPrev")]
    pub planned_count: f64,
    #[serde(rename = "couvReal")]
    pub realized_count: f64,
    #[serde(rename = "couvSupp", default, skip_serializing_if = "Option::is_none")]
    pub supplementary_count: Option<f64>,
    #[serde(rename = "percentageCouvPrev")]
    pub planned_share_pct: f64,
    #[serde(rename = "percentageCouvReal")]
    pub realized_share_pct: f64,
    #[serde(
        rename = "percentageCouvSupp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub supplementary_share_pct: Option<f64>,
}

/// A client-supplied entry for wholesale replacement. The id is kept when
/// present so existing entry ids survive a round trip through the client.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ZoneEntryInput {
    #[serde(rename = "_id", default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, message = "zone must not be empty"))]
    pub zone: String,
    #[serde(rename = "couvPrev")]
    pub planned_count: f64,
    #[serde(rename = "couvReal")]
    pub realized_count: f64,
    #[serde(rename = "couvSupp", default)]
    pub supplementary_count: Option<f64>,
    #[serde(rename = "percentageCouvPrev")]
    pub planned_share_pct: f64,
    #[serde(rename = "percentageCouvReal")]
    pub realized_share_pct: f64,
    #[serde(rename = "percentageCouvSupp", default)]
    pub supplementary_share_pct: Option<f64>,
}

impl ZoneEntryInput {
    pub fn into_entry(self) -> Result<ZoneEntry, ServiceError> {
        self.validate()?;
        let values = [
            Some(self.planned_count),
            Some(self.realized_count),
            self.supplementary_count,
            Some(self.planned_share_pct),
            Some(self.realized_share_pct),
            self.supplementary_share_pct,
        ];
        if values.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ServiceError::ValidationError(format!(
                "entry for zone '{}' contains a non-finite number",
                self.zone
            )));
        }

        Ok(ZoneEntry {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            zone: self.zone,
            planned_count: self.planned_count,
            realized_count: self.realized_count,
            supplementary_count: self.supplementary_count,
            planned_share_pct: self.planned_share_pct,
            realized_share_pct: self.realized_share_pct,
            supplementary_share_pct: self.supplementary_share_pct,
        })
    }
}

/// Field-level merge patch for a single entry. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(rename = "couvPrev", default)]
    pub planned_count: Option<f64>,
    #[serde(rename = "couvReal", default)]
    pub realized_count: Option<f64>,
    #[serde(rename = "couvSupp", default)]
    pub supplementary_count: Option<f64>,
    #[serde(rename = "percentageCouvPrev", default)]
    pub planned_share_pct: Option<f64>,
    #[serde(rename = "percentageCouvReal", default)]
    pub realized_share_pct: Option<f64>,
    #[serde(rename = "percentageCouvSupp", default)]
    pub supplementary_share_pct: Option<f64>,
}

impl EntryPatch {
    pub fn touches_supplementary(&self) -> bool {
        self.supplementary_count.is_some() || self.supplementary_share_pct.is_some()
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if matches!(&self.zone, Some(zone) if zone.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "zone must not be empty".to_string(),
            ));
        }
        let numbers = [
            self.planned_count,
            self.realized_count,
            self.supplementary_count,
            self.planned_share_pct,
            self.realized_share_pct,
            self.supplementary_share_pct,
        ];
        if numbers.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ServiceError::ValidationError(
                "patch contains a non-finite number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, entry: &mut ZoneEntry) {
        if let Some(zone) = &self.zone {
            entry.zone = zone.clone();
        }
        if let Some(v) = self.planned_count {
            entry.planned_count = v;
        }
        if let Some(v) = self.realized_count {
            entry.realized_count = v;
        }
        if let Some(v) = self.supplementary_count {
            entry.supplementary_count = Some(v);
        }
        if let Some(v) = self.planned_share_pct {
            entry.planned_share_pct = v;
        }
        if let Some(v) = self.realized_share_pct {
            entry.realized_share_pct = v;
        }
        if let Some(v) = self.supplementary_share_pct {
            entry.supplementary_share_pct = Some(v);
        }
    }
}

/// One calendar day with up to two free-text zone assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DayRecord {
    #[validate(length(min = 1, message = "day must not be empty"))]
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone2: Option<String>,
}

impl DayRecord {
    pub fn new(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            zone1: None,
            zone2: None,
        }
    }
}

/// The planned, realized and supplementary day lists of a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayRecordBundle {
    pub planned: Vec<DayRecord>,
    pub realized: Vec<DayRecord>,
    pub supplementary: Vec<DayRecord>,
}

impl DayRecordBundle {
    pub fn validate(&self) -> Result<(), ServiceError> {
        for record in self
            .planned
            .iter()
            .chain(&self.realized)
            .chain(&self.supplementary)
        {
            record.validate()?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<DayRecord>>> for DayRecordBundle {
    type Error = ServiceError;

    fn try_from(lists: Vec<Vec<DayRecord>>) -> Result<Self, Self::Error> {
        let found = lists.len();
        let [planned, realized, supplementary]: [Vec<DayRecord>; 3] =
            lists.try_into().map_err(|_| {
                ServiceError::ValidationError(format!(
                    "expected exactly 3 day-record lists (planned, realized, supplementary), got {}",
                    found
                ))
            })?;
        let bundle = Self {
            planned,
            realized,
            supplementary,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}

/// Input to `SnapshotStore::create`; entries must already be normalized.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub zone_kind: ZoneKind,
    pub entries: Vec<ZoneEntry>,
    pub days: DayRecordBundle,
    pub created_at: DateTime<Utc>,
}

/// A persisted coverage session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "zoneKind")]
    pub zone_kind: ZoneKind,
    pub entries: Vec<ZoneEntry>,
    #[serde(rename = "prevuDays")]
    pub planned_days: Vec<DayRecord>,
    #[serde(rename = "realiseDays")]
    pub realized_days: Vec<DayRecord>,
    #[serde(rename = "suppDays")]
    pub supplementary_days: Vec<DayRecord>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn entry_for_zone(&self, zone: &str) -> Option<&ZoneEntry> {
        self.entries.iter().find(|entry| entry.zone == zone)
    }
}

/// One point of a zone's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// 1-based position within the returned series.
    pub week: usize,
    #[serde(rename = "couvPrev")]
    pub planned_count: f64,
    #[serde(rename = "couvReal")]
    pub realized_count: f64,
    #[serde(rename = "percentageCouvPrev")]
    pub planned_share_pct: f64,
    #[serde(rename = "percentageCouvReal")]
    pub realized_share_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn raw_row_accepts_region_alias() {
        let row: RawRow =
            serde_json::from_value(json!({"region": "North", "couvPrev": 3, "couvReal": 1}))
                .unwrap();
        assert_eq!(row, RawRow::new("North", 3.0, 1.0));
    }

    #[test]
    fn entry_serializes_with_frontend_field_names() {
        let entry = ZoneEntry {
            id: Uuid::nil(),
            zone: "A".into(),
            planned_count: 10.0,
            realized_count: 8.0,
            supplementary_count: None,
            planned_share_pct: 25.0,
            realized_share_pct: 40.0,
            supplementary_share_pct: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["couvPrev"], json!(10.0));
        assert_eq!(value["percentageCouvReal"], json!(40.0));
        assert!(value.get("couvSupp").is_none());
        assert_eq!(value["_id"], json!(Uuid::nil().to_string()));
    }

    #[test]
    fn bundle_requires_exactly_three_lists() {
        let two = vec![vec![DayRecord::new("lundi")], vec![]];
        assert_matches!(
            DayRecordBundle::try_from(two),
            Err(ServiceError::ValidationError(_))
        );

        let three = vec![vec![DayRecord::new("lundi")], vec![], vec![]];
        let bundle = DayRecordBundle::try_from(three).unwrap();
        assert_eq!(bundle.planned.len(), 1);
    }

    #[test]
    fn bundle_rejects_blank_day_labels() {
        let lists = vec![vec![DayRecord::new("")], vec![], vec![]];
        assert_matches!(
            DayRecordBundle::try_from(lists),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn patch_only_overwrites_present_fields() {
        let mut entry = ZoneEntry {
            id: Uuid::new_v4(),
            zone: "A".into(),
            planned_count: 10.0,
            realized_count: 8.0,
            supplementary_count: None,
            planned_share_pct: 25.0,
            realized_share_pct: 40.0,
            supplementary_share_pct: None,
        };
        let patch: EntryPatch = serde_json::from_value(json!({"couvReal": 9})).unwrap();
        patch.apply(&mut entry);
        assert_eq!(entry.realized_count, 9.0);
        assert_eq!(entry.planned_count, 10.0);
        assert_eq!(entry.realized_share_pct, 40.0);
    }

    #[test]
    fn entry_input_keeps_supplied_id() {
        let id = Uuid::new_v4();
        let input: ZoneEntryInput = serde_json::from_value(json!({
            "_id": id,
            "zone": "A",
            "couvPrev": 1,
            "couvReal": 1,
            "percentageCouvPrev": 100,
            "percentageCouvReal": 100
        }))
        .unwrap();
        assert_eq!(input.into_entry().unwrap().id, id);
    }
}
