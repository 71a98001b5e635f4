//! Row mapping between `dashboard_snapshots` and `Snapshot`

#![allow(clippy::result_large_err)]

use crate::errors::{corrupt_row, Result};
use chrono::{DateTime, TimeZone, Utc};
use snapvault_core::cipher::ContentCipher;
use snapvault_core::errors::{ExError, ExErrorKind};
use snapvault_core::{Snapshot, SnapshotContent};

/// Column list shared by every SELECT that maps through `SnapshotRow`
pub const SNAPSHOT_COLUMNS: &str = "id, name, key, delete_key, org_id, user_id, external, \
     external_url, external_delete_url, dashboard, dashboard_encrypted, expires, created, updated";

/// A raw row from `dashboard_snapshots`
#[derive(Debug)]
pub struct SnapshotRow {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub delete_key: String,
    pub org_id: i64,
    pub user_id: i64,
    pub external: bool,
    pub external_url: String,
    pub external_delete_url: String,
    pub dashboard: Option<serde_json::Value>,
    pub dashboard_encrypted: Option<Vec<u8>>,
    /// Unix milliseconds
    pub expires: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

/// Map a row selected with `SNAPSHOT_COLUMNS`
pub fn row_to_snapshot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        id: row.get(0)?,
        name: row.get(1)?,
        key: row.get(2)?,
        delete_key: row.get(3)?,
        org_id: row.get(4)?,
        user_id: row.get(5)?,
        external: row.get(6)?,
        external_url: row.get(7)?,
        external_delete_url: row.get(8)?,
        dashboard: row.get(9)?,
        dashboard_encrypted: row.get(10)?,
        expires: row.get(11)?,
        created: row.get(12)?,
        updated: row.get(13)?,
    })
}

/// Content columns for insertion: `(dashboard, dashboard_encrypted)`
pub type ContentColumns = (Option<serde_json::Value>, Option<Vec<u8>>);

/// Split content into its storage columns, encrypting plain documents when
/// a cipher is configured
pub fn encode_content(
    content: &SnapshotContent,
    cipher: Option<&dyn ContentCipher>,
) -> Result<ContentColumns> {
    match (content, cipher) {
        (SnapshotContent::Plain(doc), Some(cipher)) => {
            let bytes = serde_json::to_vec(doc)
                .map_err(|e| ExError::from(e).with_op("encode_content"))?;
            Ok((None, Some(cipher.encrypt(&bytes)?)))
        }
        (SnapshotContent::Plain(doc), None) => Ok((Some(doc.clone()), None)),
        (SnapshotContent::Encrypted(bytes), _) => Ok((None, Some(bytes.clone()))),
    }
}

impl SnapshotRow {
    /// Convert to the domain model, decrypting content when possible
    pub fn into_snapshot(self, cipher: Option<&dyn ContentCipher>) -> Result<Snapshot> {
        let content = match (self.dashboard, self.dashboard_encrypted, cipher) {
            (Some(doc), None, _) => SnapshotContent::Plain(doc),
            (None, Some(bytes), Some(cipher)) => {
                let plain = cipher
                    .decrypt(&bytes)
                    .map_err(|e| e.with_entity_id(self.id.to_string()))?;
                let doc = serde_json::from_slice(&plain).map_err(|e| {
                    ExError::from(e)
                        .with_op("decode_content")
                        .with_entity_id(self.id.to_string())
                })?;
                SnapshotContent::Plain(doc)
            }
            (None, Some(bytes), None) => SnapshotContent::Encrypted(bytes),
            _ => {
                return Err(corrupt_row(
                    "decode_content",
                    self.id,
                    "row must hold exactly one of dashboard and dashboard_encrypted",
                ))
            }
        };

        Ok(Snapshot {
            id: self.id,
            name: self.name,
            key: self.key,
            delete_key: self.delete_key,
            org_id: self.org_id,
            user_id: self.user_id,
            external: self.external,
            external_url: self.external_url,
            external_delete_url: self.external_delete_url,
            expires: self.expires.map(|ms| from_millis(self.id, ms)).transpose()?,
            created: from_millis(self.id, self.created)?,
            updated: from_millis(self.id, self.updated)?,
            content,
        })
    }
}

/// Persisted representation of a timestamp
pub fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

fn from_millis(snapshot_id: i64, ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        ExError::new(ExErrorKind::Persistence)
            .with_op("decode_timestamp")
            .with_entity_id(snapshot_id.to_string())
            .with_message(format!("timestamp out of range: {}", ms))
    })
}
