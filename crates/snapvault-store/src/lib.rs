//! snapvault store - SQLite persistence for snapshots and the search projection
//!
//! Provides:
//! - Connection management and pragmas
//! - Embedded, checksummed schema migrations
//! - `SqliteSnapshotStore`, the `SnapshotStore` implementation
//! - `SqliteSearchIndex`, a `SearchIndex` over the same database

pub mod db;
pub mod errors;
pub mod migrations;
pub mod search;
pub mod snapshot;

// Re-export key types
pub use db::DbHandle;
pub use errors::Result;
pub use search::SqliteSearchIndex;
pub use snapshot::{SqliteSnapshotStore, StoreOptions};
