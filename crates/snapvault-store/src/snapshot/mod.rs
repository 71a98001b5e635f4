//! Snapshot persistence
//!
//! ## Responsibilities
//!
//! - Insert, fetch, list and delete rows of `dashboard_snapshots`
//! - Encrypt content at rest when a cipher is configured
//! - Notify the search index after each committed create/delete
//!
//! ## Non-Responsibilities
//!
//! - Validation and token generation (handled by `snapvault-core`)
//! - Search ranking (handled by the index backend)

mod rows;
pub mod sqlite_store;

pub use sqlite_store::{SqliteSnapshotStore, StoreOptions};
