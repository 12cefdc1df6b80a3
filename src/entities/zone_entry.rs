use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::errors::ServiceError;
use crate::models::ZoneEntry;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "zone_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub snapshot_id: Uuid,
    /// Order of the entry within its snapshot.
    pub position: i32,
    pub zone: String,
    pub planned_count: f64,
    pub realized_count: f64,
    pub supplementary_count: Option<f64>,
    pub planned_share_pct: f64,
    pub realized_share_pct: f64,
    pub supplementary_share_pct: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::snapshot::Entity",
        from = "Column::SnapshotId",
        to = "super::snapshot::Column::Id",
        on_delete = "Cascade"
    )]
    Snapshot,
}

impl Related<super::snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ZoneEntry {
    fn from(model: Model) -> Self {
        ZoneEntry {
            id: model.id,
            zone: model.zone,
            planned_count: model.planned_count,
            realized_count: model.realized_count,
            supplementary_count: model.supplementary_count,
            planned_share_pct: model.planned_share_pct,
            realized_share_pct: model.realized_share_pct,
            supplementary_share_pct: model.supplementary_share_pct,
        }
    }
}

impl ActiveModel {
    pub fn from_entry(
        snapshot_id: Uuid,
        position: usize,
        entry: &ZoneEntry,
    ) -> Result<Self, ServiceError> {
        let position = i32::try_from(position).map_err(|_| {
            ServiceError::ValidationError(format!("entry position {} is out of range", position))
        })?;
        Ok(ActiveModel {
            id: Set(entry.id),
            snapshot_id: Set(snapshot_id),
            position: Set(position),
            zone: Set(entry.zone.clone()),
            planned_count: Set(entry.planned_count),
            realized_count: Set(entry.realized_count),
            supplementary_count: Set(entry.supplementary_count),
            planned_share_pct: Set(entry.planned_share_pct),
            realized_share_pct: Set(entry.realized_share_pct),
            supplementary_share_pct: Set(entry.supplementary_share_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry() -> ZoneEntry {
        ZoneEntry {
            id: Uuid::new_v4(),
            zone: "Nord".to_string(),
            planned_count: 4.0,
            realized_count: 2.0,
            supplementary_count: None,
            planned_share_pct: 100.0,
            realized_share_pct: 100.0,
            supplementary_share_pct: None,
        }
    }

    #[test]
    fn active_model_keeps_position_and_values() {
        let entry = entry();
        let snapshot_id = Uuid::new_v4();
        let active = ActiveModel::from_entry(snapshot_id, 7, &entry).unwrap();

        assert_eq!(active.position.unwrap(), 7);
        assert_eq!(active.snapshot_id.unwrap(), snapshot_id);
        assert_eq!(active.id.unwrap(), entry.id);
        assert_eq!(active.zone.unwrap(), "Nord");
    }

    #[test]
    fn positions_beyond_the_column_range_are_rejected() {
        let overflow = usize::try_from(i32::MAX).unwrap() + 1;
        assert_matches!(
            ActiveModel::from_entry(Uuid::new_v4(), overflow, &entry()),
            Err(ServiceError::ValidationError(msg)) if msg.contains("out of range")
        );
    }
}
