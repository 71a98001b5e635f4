//! SQLite `SnapshotStore` implementation

#![allow(clippy::result_large_err)]

use super::rows::{encode_content, row_to_snapshot_row, to_millis, SnapshotRow, SNAPSHOT_COLUMNS};
use crate::db::DbHandle;
use crate::errors::{from_insert_error, from_rusqlite, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use snapvault_core::cipher::ContentCipher;
use snapvault_core::errors::{lock_poisoned, ExError, SnapshotError};
use snapvault_core::redaction;
use snapvault_core::search::{SearchIndex, SNAPSHOT_KIND};
use snapvault_core_types::schema::EVENT_INDEX_INCONSISTENT;
use snapvault_core::store::{GetByKeyQuery, ListQuery, SnapshotStore};
use snapvault_core::Snapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};

/// Optional store behavior
#[derive(Clone)]
pub struct StoreOptions {
    /// Weight given to snapshot entries in the search index
    pub index_weight: u32,
    /// Encrypts content at rest when set
    pub cipher: Option<Arc<dyn ContentCipher>>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            index_weight: 1,
            cipher: None,
        }
    }
}

impl StoreOptions {
    pub fn with_index_weight(mut self, weight: u32) -> Self {
        self.index_weight = weight;
        self
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn ContentCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }
}

/// Snapshot store backed by the `dashboard_snapshots` table.
///
/// The index is notified after each statement commits and the connection
/// lock has been released, so a `SqliteSearchIndex` may share `db`.
pub struct SqliteSnapshotStore {
    db: DbHandle,
    index: Arc<dyn SearchIndex>,
    cipher: Option<Arc<dyn ContentCipher>>,
    index_weight: u32,
    index_failures: AtomicU64,
}

impl SqliteSnapshotStore {
    pub fn new(db: DbHandle, index: Arc<dyn SearchIndex>) -> Self {
        Self::with_options(db, index, StoreOptions::default())
    }

    pub fn with_options(db: DbHandle, index: Arc<dyn SearchIndex>, options: StoreOptions) -> Self {
        Self {
            db,
            index,
            cipher: options.cipher,
            index_weight: options.index_weight,
            index_failures: AtomicU64::new(0),
        }
    }

    /// Number of index notifications that failed since construction
    pub fn index_failures(&self) -> u64 {
        self.index_failures.load(Ordering::Relaxed)
    }

    fn conn(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| lock_poisoned(op))
    }

    fn cipher(&self) -> Option<&dyn ContentCipher> {
        self.cipher.as_deref()
    }

    fn notify_add(&self, snapshot: &Snapshot) {
        let result = self.index.add(
            &snapshot.name,
            SNAPSHOT_KIND,
            &snapshot.key,
            snapshot.org_id,
            self.index_weight,
        );
        if let Err(err) = result {
            self.report_index_failure("index_add", snapshot.org_id, &err);
        }
    }

    fn notify_delete(&self, removed: &[(String, i64)]) {
        for (key, org_id) in removed {
            if let Err(err) = self.index.delete(SNAPSHOT_KIND, key, *org_id) {
                self.report_index_failure("index_delete", *org_id, &err);
            }
        }
    }

    fn report_index_failure(&self, op: &str, org_id: i64, err: &ExError) {
        self.index_failures.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            component = "snapshot_store",
            op,
            event = EVENT_INDEX_INCONSISTENT,
            org_id,
            err_code = err.code(),
            "search index out of step with snapshot store: {}",
            err.message()
        );
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn create(&self, mut snapshot: Snapshot) -> Result<Snapshot> {
        let (dashboard, dashboard_encrypted) = encode_content(&snapshot.content, self.cipher())?;

        let id = {
            let conn = self.conn("create_snapshot")?;
            conn.execute(
                "INSERT INTO dashboard_snapshots (
                    name, key, delete_key, org_id, user_id, external, external_url,
                    external_delete_url, dashboard, dashboard_encrypted, expires, created, updated
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    snapshot.name,
                    snapshot.key,
                    snapshot.delete_key,
                    snapshot.org_id,
                    snapshot.user_id,
                    snapshot.external,
                    snapshot.external_url,
                    snapshot.external_delete_url,
                    dashboard,
                    dashboard_encrypted,
                    snapshot.expires.map(to_millis),
                    to_millis(snapshot.created),
                    to_millis(snapshot.updated),
                ],
            )
            .map_err(|e| from_insert_error("create_snapshot", e))?;
            conn.last_insert_rowid()
        };

        snapshot.id = id;
        tracing::debug!(snapshot_id = id, org_id = snapshot.org_id, "Persisted snapshot");

        self.notify_add(&snapshot);
        Ok(snapshot)
    }

    fn get_by_key(&self, query: &GetByKeyQuery) -> Result<Snapshot> {
        let row = {
            let conn = self.conn("get_snapshot")?;
            select_by_key(&conn, &query.key, query.delete_key.as_deref())?
        };

        let row = row.ok_or_else(|| ExError::from(SnapshotError::NotFound).with_op("get_snapshot"))?;
        let snapshot = row.into_snapshot(self.cipher())?;
        // select_by_key already matched the delete key when one was given
        let verified = query.delete_key.is_some();
        Ok(redaction::apply(snapshot, query.include_secrets && verified))
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Snapshot>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let rows = {
            let conn = self.conn("list_snapshots")?;
            select_for_org(&conn, query)?
        };

        rows.into_iter()
            .map(|row| row.into_snapshot(self.cipher()).map(Snapshot::into_redacted))
            .collect()
    }

    fn delete_by_delete_key(&self, delete_key: &str) -> Result<bool> {
        let removed = {
            let conn = self.conn("delete_snapshot")?;
            conn.query_row(
                "DELETE FROM dashboard_snapshots WHERE delete_key = ?1 RETURNING key, org_id",
                [delete_key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(|e| from_rusqlite("delete_snapshot", e))?
        };

        match removed {
            Some(entry) => {
                tracing::debug!(org_id = entry.1, "Deleted snapshot");
                self.notify_delete(std::slice::from_ref(&entry));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = {
            let conn = self.conn("delete_expired")?;
            delete_expiring_before(&conn, to_millis(now))?
        };

        tracing::debug!(count = removed.len(), "Deleted expired snapshots");
        self.notify_delete(&removed);
        Ok(removed.len() as u64)
    }
}

fn select_by_key(
    conn: &Connection,
    key: &str,
    delete_key: Option<&str>,
) -> Result<Option<SnapshotRow>> {
    let sql = format!(
        "SELECT {} FROM dashboard_snapshots
         WHERE key = ?1 AND (?2 IS NULL OR delete_key = ?2)",
        SNAPSHOT_COLUMNS
    );
    conn.query_row(&sql, rusqlite::params![key, delete_key], row_to_snapshot_row)
        .optional()
        .map_err(|e| from_rusqlite("get_snapshot", e))
}

fn select_for_org(conn: &Connection, query: &ListQuery) -> Result<Vec<SnapshotRow>> {
    let sql = format!(
        "SELECT {} FROM dashboard_snapshots
         WHERE org_id = ?1
           AND (?2 IS NULL OR substr(name, 1, length(?2)) = ?2)
         ORDER BY created DESC, id DESC
         LIMIT ?3",
        SNAPSHOT_COLUMNS
    );
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| from_rusqlite("list_snapshots", e))?;
    let rows = stmt
        .query_map(
            rusqlite::params![query.org_id, query.name_prefix, limit],
            row_to_snapshot_row,
        )
        .map_err(|e| from_rusqlite("list_snapshots", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| from_rusqlite("list_snapshots", e))?;

    Ok(rows)
}

/// One statement: rows become invisible to concurrent readers atomically
fn delete_expiring_before(conn: &Connection, now_ms: i64) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn
        .prepare(
            "DELETE FROM dashboard_snapshots
             WHERE expires IS NOT NULL AND expires <= ?1
             RETURNING key, org_id",
        )
        .map_err(|e| from_rusqlite("delete_expired", e))?;
    let removed = stmt
        .query_map([now_ms], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| from_rusqlite("delete_expired", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| from_rusqlite("delete_expired", e))?;

    Ok(removed)
}
