//! Snapshot record

use crate::model::content::SnapshotContent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapvault_core_types::Sensitive;

/// Name given to snapshots created without one
pub const DEFAULT_SNAPSHOT_NAME: &str = "Unnamed snapshot";

/// A dashboard captured at a specific point in time.
///
/// `key` grants read access and `delete_key` grants delete access; both are
/// bearer capabilities and are never derived from `org_id`/`user_id`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Storage-assigned id, `0` until persisted
    pub id: i64,
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delete_key: String,
    pub org_id: i64,
    pub user_id: i64,
    pub external: bool,
    #[serde(default)]
    pub external_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_delete_url: String,
    /// `None` means the snapshot never expires
    pub expires: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(flatten)]
    pub content: SnapshotContent,
}

impl Snapshot {
    /// Whether an expiry sweep at `now` removes this snapshot
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Whether the snapshot still carries delete-capability fields
    pub fn has_secrets(&self) -> bool {
        !self.delete_key.is_empty() || !self.external_delete_url.is_empty()
    }
}

// Keys stay out of debug output so snapshots can be logged freely.
impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &Sensitive::new(&self.key))
            .field("delete_key", &Sensitive::new(&self.delete_key))
            .field("org_id", &self.org_id)
            .field("user_id", &self.user_id)
            .field("external", &self.external)
            .field("external_url", &self.external_url)
            .field("external_delete_url", &Sensitive::new(&self.external_delete_url))
            .field("expires", &self.expires)
            .field("created", &self.created)
            .field("updated", &self.updated)
            .field("encrypted", &self.content.is_encrypted())
            .finish()
    }
}
