use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::errors::ServiceError;
use crate::models::{DayRecord, Snapshot, ZoneEntry, ZoneKind};

/// The `snapshots` table. Day-record lists are stored as JSON arrays.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub zone_kind: ZoneKind,
    pub planned_days: Json,
    pub realized_days: Json,
    pub supplementary_days: Json,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::zone_entry::Entity")]
    ZoneEntries,
}

impl Related<super::zone_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ZoneEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn day_records(value: Json) -> Result<Vec<DayRecord>, ServiceError> {
    Ok(serde_json::from_value(value)?)
}

impl Model {
    /// Assembles the domain snapshot from this row and its entry rows.
    pub fn into_snapshot(
        self,
        mut entries: Vec<super::zone_entry::Model>,
    ) -> Result<Snapshot, ServiceError> {
        entries.sort_by_key(|entry| entry.position);
        Ok(Snapshot {
            id: self.id,
            zone_kind: self.zone_kind,
            entries: entries.into_iter().map(ZoneEntry::from).collect(),
            planned_days: day_records(self.planned_days)?,
            realized_days: day_records(self.realized_days)?,
            supplementary_days: day_records(self.supplementary_days)?,
            created_at: self.created_at,
        })
    }
}
