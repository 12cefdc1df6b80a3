// Share computation and history queries
pub mod normalizer;
pub mod series;

// Snapshot lifecycle
pub mod snapshots;

// User store
pub mod credentials;

pub use credentials::{Credential, CredentialService, CredentialStore};
pub use series::SeriesExtractor;
pub use snapshots::{EntryPatchPolicy, SnapshotService};
