pub mod common;
pub mod health;
pub mod users;
pub mod zones;

use std::sync::Arc;

use crate::db::DbPool;
use crate::repositories::{SnapshotRepository, SnapshotStore, UserRepository};
use crate::services::{
    CredentialService, CredentialStore, EntryPatchPolicy, SeriesExtractor, SnapshotService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub snapshots: Arc<SnapshotService>,
    pub series: Arc<SeriesExtractor>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppServices {
    /// Wires the sea-orm stores into the services.
    pub fn new(db_pool: Arc<DbPool>, patch_policy: EntryPatchPolicy) -> Self {
        let store: Arc<dyn SnapshotStore> = Arc::new(SnapshotRepository::new(db_pool.clone()));
        let users = UserRepository::new(db_pool);

        Self {
            snapshots: Arc::new(SnapshotService::new(store.clone(), patch_policy)),
            series: Arc::new(SeriesExtractor::new(store)),
            credentials: Arc::new(CredentialService::new(users)),
        }
    }
}
