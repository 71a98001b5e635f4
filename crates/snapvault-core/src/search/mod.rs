//! Full-text search contract
//!
//! The snapshot store notifies a `SearchIndex` when snapshots are created or
//! deleted. Index state is a projection: the store stays authoritative and
//! index failures are reported, never propagated.

pub mod memory;
pub mod tokenize;

use crate::errors::Result;
use serde::{Deserialize, Serialize};

pub use memory::MemorySearchIndex;

/// `kind` used for snapshot entries
pub const SNAPSHOT_KIND: &str = "snapshot";

/// A denormalized, queryable projection of an indexed entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Index-local id, unrelated to the source entity's id
    pub id: i64,
    pub text: String,
    pub kind: String,
    /// Stable reference back to the source entity (a snapshot `key`)
    pub uid: String,
    pub org_id: i64,
    pub weight: u32,
}

/// A pluggable search backend.
///
/// Implementations receive their storage handle at construction time.
pub trait SearchIndex: Send + Sync {
    /// Index `text` for `(kind, uid, org_id)`, replacing any prior entry
    ///
    /// # Errors
    ///
    /// `Index` on backend failure or after `close`.
    fn add(&self, text: &str, kind: &str, uid: &str, org_id: i64, weight: u32) -> Result<()>;

    /// Entries of `org_id` matching `query`, best first
    ///
    /// Ordering is by relevance, then weight descending, then index id, so
    /// identical state and query always give identical output.
    ///
    /// # Errors
    ///
    /// `Index` on backend failure or after `close`.
    fn search(&self, query: &str, org_id: i64) -> Result<Vec<SearchResult>>;

    /// Remove the entry for `(kind, uid, org_id)`; absent entries are a no-op
    ///
    /// # Errors
    ///
    /// `Index` on backend failure or after `close`.
    fn delete(&self, kind: &str, uid: &str, org_id: i64) -> Result<()>;

    /// Release resources; later calls fail
    ///
    /// # Errors
    ///
    /// `Index` if the backend fails to shut down cleanly.
    fn close(&self) -> Result<()>;
}
