//! Snapshot persistence contract
//!
//! The SQLite implementation lives in `snapvault-store`. Implementations
//! must be shareable across threads; each operation is individually atomic
//! and no cross-operation transaction is visible to callers.

use crate::errors::Result;
use crate::model::Snapshot;
use chrono::{DateTime, Utc};

/// Fetch a snapshot by its read key
#[derive(Debug, Clone, Default)]
pub struct GetByKeyQuery {
    pub key: String,
    /// When set, must match the stored delete key or the lookup is a miss
    pub delete_key: Option<String>,
    /// Return `delete_key`/`external_delete_url` instead of redacting them.
    /// Only honored together with a matching `delete_key`.
    pub include_secrets: bool,
}

impl GetByKeyQuery {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_delete_key(mut self, delete_key: impl Into<String>) -> Self {
        self.delete_key = Some(delete_key.into());
        self
    }

    pub fn include_secrets(mut self) -> Self {
        self.include_secrets = true;
        self
    }
}

/// Enumerate an organization's snapshots
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub org_id: i64,
    /// Only names starting with this prefix (case-sensitive)
    pub name_prefix: Option<String>,
    pub limit: usize,
}

impl ListQuery {
    pub fn new(org_id: i64, limit: usize) -> Self {
        Self {
            org_id,
            name_prefix: None,
            limit,
        }
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }
}

/// Persistence of snapshot records
pub trait SnapshotStore: Send + Sync {
    /// Persist `snapshot`, returning it with its assigned `id`
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if `key` or `delete_key` already exists
    /// - `Persistence` on storage failure
    fn create(&self, snapshot: Snapshot) -> Result<Snapshot>;

    /// Fetch by read key, verifying the delete key when one is supplied
    ///
    /// # Errors
    ///
    /// - `NotFound` when no row matches, including a delete key mismatch
    /// - `Persistence` on storage failure
    fn get_by_key(&self, query: &GetByKeyQuery) -> Result<Snapshot>;

    /// Snapshots owned by `query.org_id`, newest first, redacted
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure.
    fn list(&self, query: &ListQuery) -> Result<Vec<Snapshot>>;

    /// Delete the snapshot holding `delete_key`; `false` when none does
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure.
    fn delete_by_delete_key(&self, delete_key: &str) -> Result<bool>;

    /// Delete every snapshot with an expiry at or before `now`
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
