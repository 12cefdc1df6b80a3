use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::observe;
use crate::entities::{snapshot, zone_entry};
use crate::errors::ServiceError;
use crate::models::{DayRecordBundle, NewSnapshot, SeriesWindow, Snapshot, ZoneEntry, ZoneKind};
use crate::repositories::{BaseRepository, Repository, SnapshotStore};

/// sea-orm backed [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    base: BaseRepository,
}

fn snapshot_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Session {} not found", id))
}

fn entry_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Entry {} not found", id))
}

fn entry_write_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::ValidationError("entry ids must be unique".to_string())
        }
        _ => ServiceError::DatabaseError(err),
    }
}

/// Start of a window spanning the last `weeks` weeks, or `None` when it
/// reaches before the earliest representable timestamp.
fn weeks_ago(weeks: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(7 * i64::from(weeks)).and_then(|span| Utc::now().checked_sub_signed(span))
}

impl SnapshotRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn find_model<C: ConnectionTrait>(
        db: &C,
        kind: ZoneKind,
        id: Uuid,
    ) -> Result<snapshot::Model, ServiceError> {
        snapshot::Entity::find_by_id(id)
            .filter(snapshot::Column::ZoneKind.eq(kind))
            .one(db)
            .await?
            .ok_or_else(|| snapshot_not_found(id))
    }

    async fn hydrate_one<C: ConnectionTrait>(
        db: &C,
        model: snapshot::Model,
    ) -> Result<Snapshot, ServiceError> {
        let entries = model.find_related(zone_entry::Entity).all(db).await?;
        model.into_snapshot(entries)
    }

    async fn hydrate_many<C: ConnectionTrait>(
        db: &C,
        models: Vec<snapshot::Model>,
    ) -> Result<Vec<Snapshot>, ServiceError> {
        let entries = models.load_many(zone_entry::Entity, db).await?;
        models
            .into_iter()
            .zip(entries)
            .map(|(model, entries)| model.into_snapshot(entries))
            .collect()
    }

    async fn insert_entries<C: ConnectionTrait>(
        db: &C,
        snapshot_id: Uuid,
        entries: &[ZoneEntry],
    ) -> Result<(), ServiceError> {
        if entries.is_empty() {
            return Ok(());
        }
        let rows = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| zone_entry::ActiveModel::from_entry(snapshot_id, position, entry))
            .collect::<Result<Vec<_>, _>>()?;
        zone_entry::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await
            .map_err(entry_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn create(&self, new: NewSnapshot) -> Result<Snapshot, ServiceError> {
        observe("snapshot.create", async move {
            let db = self.base.get_db();
            let txn = db.begin().await?;

            let model = snapshot::ActiveModel {
                id: Set(Uuid::new_v4()),
                zone_kind: Set(new.zone_kind),
                planned_days: Set(serde_json::to_value(&new.days.planned)?),
                realized_days: Set(serde_json::to_value(&new.days.realized)?),
                supplementary_days: Set(serde_json::to_value(&new.days.supplementary)?),
                created_at: Set(new.created_at),
            }
            .insert(&txn)
            .await?;

            Self::insert_entries(&txn, model.id, &new.entries).await?;
            txn.commit().await?;

            debug!(snapshot_id = %model.id, kind = %new.zone_kind, "snapshot inserted");
            Ok::<_, ServiceError>(Snapshot {
                id: model.id,
                zone_kind: model.zone_kind,
                entries: new.entries,
                planned_days: new.days.planned,
                realized_days: new.days.realized,
                supplementary_days: new.days.supplementary,
                created_at: model.created_at,
            })
        })
        .await
    }

    async fn get_by_id(&self, kind: ZoneKind, id: Uuid) -> Result<Snapshot, ServiceError> {
        observe("snapshot.get_by_id", async move {
            let db = self.base.get_db();
            let model = Self::find_model(db, kind, id).await?;
            Self::hydrate_one(db, model).await
        })
        .await
    }

    async fn list_all(&self, kind: Option<ZoneKind>) -> Result<Vec<Snapshot>, ServiceError> {
        observe("snapshot.list_all", async move {
            let db = self.base.get_db();
            let mut query = snapshot::Entity::find();
            if let Some(kind) = kind {
                query = query.filter(snapshot::Column::ZoneKind.eq(kind));
            }
            let models = query
                .order_by_desc(snapshot::Column::CreatedAt)
                .all(db)
                .await?;
            Self::hydrate_many(db, models).await
        })
        .await
    }

    async fn get_latest(&self, kind: ZoneKind) -> Result<Snapshot, ServiceError> {
        observe("snapshot.get_latest", async move {
            let db = self.base.get_db();
            let model = snapshot::Entity::find()
                .filter(snapshot::Column::ZoneKind.eq(kind))
                .order_by_desc(snapshot::Column::CreatedAt)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("No sessions found".to_string()))?;
            Self::hydrate_one(db, model).await
        })
        .await
    }

    async fn find_containing_zone(
        &self,
        kind: ZoneKind,
        zone: &str,
        window: SeriesWindow,
    ) -> Result<Vec<Snapshot>, ServiceError> {
        observe("snapshot.find_containing_zone", async move {
            let db = self.base.get_db();
            let owners = Query::select()
                .column(zone_entry::Column::SnapshotId)
                .from(zone_entry::Entity)
                .and_where(zone_entry::Column::Zone.eq(zone))
                .to_owned();
            let query = snapshot::Entity::find()
                .filter(snapshot::Column::ZoneKind.eq(kind))
                .filter(snapshot::Column::Id.in_subquery(owners));

            let models = match window {
                SeriesWindow::Latest(n) => {
                    let mut newest = query
                        .order_by_desc(snapshot::Column::CreatedAt)
                        .limit(u64::from(n))
                        .all(db)
                        .await?;
                    newest.reverse();
                    newest
                }
                SeriesWindow::Weeks(n) => {
                    // a span past the representable range covers every snapshot
                    let query = match weeks_ago(n) {
                        Some(since) => query.filter(snapshot::Column::CreatedAt.gte(since)),
                        None => query,
                    };
                    query
                        .order_by_asc(snapshot::Column::CreatedAt)
                        .all(db)
                        .await?
                }
            };
            Self::hydrate_many(db, models).await
        })
        .await
    }

    async fn replace_day_records(
        &self,
        kind: ZoneKind,
        id: Uuid,
        days: DayRecordBundle,
    ) -> Result<Snapshot, ServiceError> {
        observe("snapshot.replace_day_records", async move {
            let txn = self.base.get_db().begin().await?;
            let mut active = Self::find_model(&txn, kind, id).await?.into_active_model();
            active.planned_days = Set(serde_json::to_value(&days.planned)?);
            active.realized_days = Set(serde_json::to_value(&days.realized)?);
            active.supplementary_days = Set(serde_json::to_value(&days.supplementary)?);
            let model = active.update(&txn).await?;

            let snapshot = Self::hydrate_one(&txn, model).await?;
            txn.commit().await?;
            Ok::<_, ServiceError>(snapshot)
        })
        .await
    }

    async fn replace_entries(
        &self,
        kind: ZoneKind,
        id: Uuid,
        entries: Vec<ZoneEntry>,
    ) -> Result<Snapshot, ServiceError> {
        observe("snapshot.replace_entries", async move {
            let txn = self.base.get_db().begin().await?;
            let model = Self::find_model(&txn, kind, id).await?;

            zone_entry::Entity::delete_many()
                .filter(zone_entry::Column::SnapshotId.eq(id))
                .exec(&txn)
                .await?;
            Self::insert_entries(&txn, id, &entries).await?;
            txn.commit().await?;

            Ok::<_, ServiceError>(Snapshot {
                entries,
                ..model.into_snapshot(Vec::new())?
            })
        })
        .await
    }

    async fn find_by_entry(
        &self,
        kind: ZoneKind,
        entry_id: Uuid,
    ) -> Result<Snapshot, ServiceError> {
        observe("snapshot.find_by_entry", async move {
            let db = self.base.get_db();
            let entry = zone_entry::Entity::find_by_id(entry_id)
                .one(db)
                .await?
                .ok_or_else(|| entry_not_found(entry_id))?;
            let model = Self::find_model(db, kind, entry.snapshot_id)
                .await
                .map_err(|e| match e {
                    ServiceError::NotFound(_) => entry_not_found(entry_id),
                    other => other,
                })?;
            Self::hydrate_one(db, model).await
        })
        .await
    }

    async fn delete(&self, kind: ZoneKind, id: Uuid) -> Result<(), ServiceError> {
        observe("snapshot.delete", async move {
            let txn = self.base.get_db().begin().await?;
            let model = Self::find_model(&txn, kind, id).await?;
            zone_entry::Entity::delete_many()
                .filter(zone_entry::Column::SnapshotId.eq(id))
                .exec(&txn)
                .await?;
            model.delete(&txn).await?;
            txn.commit().await?;
            Ok::<_, ServiceError>(())
        })
        .await
    }

    async fn delete_entry(&self, kind: ZoneKind, entry_id: Uuid) -> Result<(), ServiceError> {
        observe("snapshot.delete_entry", async move {
            let db = self.base.get_db();
            let owned = zone_entry::Entity::find_by_id(entry_id)
                .inner_join(snapshot::Entity)
                .filter(snapshot::Column::ZoneKind.eq(kind))
                .one(db)
                .await?
                .ok_or_else(|| entry_not_found(entry_id))?;
            owned.delete(db).await?;
            Ok::<_, ServiceError>(())
        })
        .await
    }
}
