//! Snapshot data model

pub mod content;
pub mod snapshot;

pub use content::SnapshotContent;
pub use snapshot::{Snapshot, DEFAULT_SNAPSHOT_NAME};
