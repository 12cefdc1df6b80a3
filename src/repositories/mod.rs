use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{DayRecordBundle, NewSnapshot, SeriesWindow, Snapshot, ZoneEntry, ZoneKind};

pub mod snapshot_repository;
pub mod user_repository;

pub use snapshot_repository::SnapshotRepository;
pub use user_repository::UserRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Persistence contract for coverage snapshots.
///
/// Every operation is scoped to one [`ZoneKind`]; ids that exist under a
/// different kind are reported as `NotFound`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Writes a snapshot together with its entries.
    async fn create(&self, snapshot: NewSnapshot) -> Result<Snapshot, ServiceError>;

    async fn get_by_id(&self, kind: ZoneKind, id: Uuid) -> Result<Snapshot, ServiceError>;

    /// Newest first. `None` lists every kind.
    async fn list_all(&self, kind: Option<ZoneKind>) -> Result<Vec<Snapshot>, ServiceError>;

    async fn get_latest(&self, kind: ZoneKind) -> Result<Snapshot, ServiceError>;

    /// Snapshots holding an entry for `zone`, oldest first.
    async fn find_containing_zone(
        &self,
        kind: ZoneKind,
        zone: &str,
        window: SeriesWindow,
    ) -> Result<Vec<Snapshot>, ServiceError>;

    async fn replace_day_records(
        &self,
        kind: ZoneKind,
        id: Uuid,
        days: DayRecordBundle,
    ) -> Result<Snapshot, ServiceError>;

    async fn replace_entries(
        &self,
        kind: ZoneKind,
        id: Uuid,
        entries: Vec<ZoneEntry>,
    ) -> Result<Snapshot, ServiceError>;

    /// The snapshot owning `entry_id`.
    async fn find_by_entry(&self, kind: ZoneKind, entry_id: Uuid)
        -> Result<Snapshot, ServiceError>;

    async fn delete(&self, kind: ZoneKind, id: Uuid) -> Result<(), ServiceError>;

    /// Removes one entry; the owning snapshot is kept even when left empty.
    async fn delete_entry(&self, kind: ZoneKind, entry_id: Uuid) -> Result<(), ServiceError>;
}
