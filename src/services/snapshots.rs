use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    DayRecord, DayRecordBundle, EntryPatch, NewSnapshot, RawRow, Snapshot, ZoneEntryInput,
    ZoneKind,
};
use crate::repositories::SnapshotStore;
use crate::services::normalizer::{self, ColumnSet};

/// How shares are treated after a single entry is patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPatchPolicy {
    /// Patched fields are stored verbatim; sibling shares are untouched.
    #[default]
    PassThrough,
    /// Every share in the owning snapshot is re-derived from the counts.
    Recompute,
}

/// Service for creating, reading and editing coverage snapshots
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn SnapshotStore>,
    patch_policy: EntryPatchPolicy,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn SnapshotStore>, patch_policy: EntryPatchPolicy) -> Self {
        Self {
            store,
            patch_policy,
        }
    }

    /// Normalizes `rows` and persists them as a new snapshot
    #[instrument(skip(self, rows, days), fields(row_count = rows.len()))]
    pub async fn save(
        &self,
        kind: ZoneKind,
        rows: Vec<RawRow>,
        days: DayRecordBundle,
    ) -> Result<Snapshot, ServiceError> {
        let profile = kind.profile();
        if !profile.day_records && days != DayRecordBundle::default() {
            return Err(ServiceError::ValidationError(format!(
                "{} sessions do not carry day records",
                kind
            )));
        }
        days.validate()?;

        let entries = normalizer::normalize(&rows, ColumnSet::from(profile))?;
        let snapshot = self
            .store
            .create(NewSnapshot {
                zone_kind: kind,
                entries,
                days,
                created_at: Utc::now(),
            })
            .await?;

        counter!("coverage.snapshots.saved", 1, "kind" => kind.prefix());
        info!(snapshot_id = %snapshot.id, kind = %kind, "Session saved");
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, kind: ZoneKind) -> Result<Vec<Snapshot>, ServiceError> {
        self.store.list_all(Some(kind)).await
    }

    /// Every snapshot of every kind, newest first
    #[instrument(skip(self))]
    pub async fn list_all_zones(&self) -> Result<Vec<Snapshot>, ServiceError> {
        self.store.list_all(None).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, kind: ZoneKind, id: Uuid) -> Result<Snapshot, ServiceError> {
        self.store.get_by_id(kind, id).await
    }

    #[instrument(skip(self))]
    pub async fn latest(&self, kind: ZoneKind) -> Result<Snapshot, ServiceError> {
        self.store.get_latest(kind).await
    }

    /// Replaces the three day-record lists, given in planned, realized,
    /// supplementary order.
    #[instrument(skip(self, lists))]
    pub async fn replace_day_records(
        &self,
        kind: ZoneKind,
        id: Uuid,
        lists: Vec<Vec<DayRecord>>,
    ) -> Result<Snapshot, ServiceError> {
        if !kind.profile().day_records {
            return Err(ServiceError::ValidationError(format!(
                "{} sessions do not carry day records",
                kind
            )));
        }
        let bundle = DayRecordBundle::try_from(lists)?;
        let snapshot = self.store.replace_day_records(kind, id, bundle).await?;
        info!(snapshot_id = %id, kind = %kind, "Session day records replaced");
        Ok(snapshot)
    }

    /// Replaces the whole entry list. Shares are stored as supplied.
    #[instrument(skip(self, inputs), fields(entries = inputs.len()))]
    pub async fn replace_entries(
        &self,
        kind: ZoneKind,
        id: Uuid,
        inputs: Vec<ZoneEntryInput>,
    ) -> Result<Snapshot, ServiceError> {
        if inputs.is_empty() {
            return Err(ServiceError::ValidationError(
                "entries must be a non-empty list".to_string(),
            ));
        }
        let supplementary = kind.profile().supplementary_column;
        let entries = inputs
            .into_iter()
            .map(|input| {
                let entry = input.into_entry()?;
                if !supplementary && entry.supplementary_count.is_some() {
                    return Err(ServiceError::ValidationError(format!(
                        "{} entries do not carry supplementary coverage",
                        kind
                    )));
                }
                Ok(entry)
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let snapshot = self.store.replace_entries(kind, id, entries).await?;
        info!(snapshot_id = %id, kind = %kind, "Session entries replaced");
        Ok(snapshot)
    }

    /// Merges `patch` into one entry and re-saves the owning snapshot.
    ///
    /// Locating and re-saving are separate store calls, so two concurrent
    /// patches against the same snapshot resolve as last writer wins.
    #[instrument(skip(self, patch))]
    pub async fn update_entry(
        &self,
        kind: ZoneKind,
        entry_id: Uuid,
        patch: EntryPatch,
    ) -> Result<Snapshot, ServiceError> {
        patch.validate()?;
        if !kind.profile().supplementary_column && patch.touches_supplementary() {
            return Err(ServiceError::ValidationError(format!(
                "{} entries do not carry supplementary coverage",
                kind
            )));
        }

        let snapshot = self.store.find_by_entry(kind, entry_id).await?;
        let mut entries = snapshot.entries;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Entry {} not found", entry_id)))?;
        patch.apply(entry);

        if self.patch_policy == EntryPatchPolicy::Recompute {
            normalizer::renormalize(&mut entries);
        }

        let updated = self
            .store
            .replace_entries(kind, snapshot.id, entries)
            .await?;
        info!(
            snapshot_id = %updated.id,
            entry_id = %entry_id,
            policy = ?self.patch_policy,
            "Entry updated"
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, kind: ZoneKind, id: Uuid) -> Result<(), ServiceError> {
        self.store.delete(kind, id).await?;
        counter!("coverage.snapshots.deleted", 1, "kind" => kind.prefix());
        info!(snapshot_id = %id, kind = %kind, "Session deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_entry(&self, kind: ZoneKind, entry_id: Uuid) -> Result<(), ServiceError> {
        self.store.delete_entry(kind, entry_id).await?;
        info!(entry_id = %entry_id, kind = %kind, "Entry deleted");
        Ok(())
    }
}
