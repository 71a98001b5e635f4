//! Search projection persisted alongside snapshots

pub mod sqlite_index;

pub use sqlite_index::SqliteSearchIndex;
