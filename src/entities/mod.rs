pub mod snapshot;
pub mod user;
pub mod zone_entry;
