//! `SearchIndex` over the `search_entries` table
//!
//! Matching and ordering reuse the core tokenizer, so results agree with
//! `MemorySearchIndex` for identical contents.

#![allow(clippy::result_large_err)]

use crate::db::DbHandle;
use crate::errors::{index_error, Result};
use rusqlite::Connection;
use snapvault_core::errors::{lock_poisoned, ExError, ExErrorKind};
use snapvault_core::search::{tokenize, SearchIndex, SearchResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::MutexGuard;

/// Search index sharing the snapshot database
pub struct SqliteSearchIndex {
    db: DbHandle,
    closed: AtomicBool,
}

impl SqliteSearchIndex {
    /// The `search_entries` table must already exist (see `migrations`)
    pub fn new(db: DbHandle) -> Self {
        Self {
            db,
            closed: AtomicBool::new(false),
        }
    }

    fn conn(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ExError::new(ExErrorKind::Index)
                .with_op(op.to_string())
                .with_message("index is closed"));
        }
        self.db.lock().map_err(|_| lock_poisoned(op))
    }
}

impl SearchIndex for SqliteSearchIndex {
    fn add(&self, text: &str, kind: &str, uid: &str, org_id: i64, weight: u32) -> Result<()> {
        let conn = self.conn("index_add")?;
        conn.execute(
            "INSERT INTO search_entries (text, kind, uid, org_id, weight)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(kind, uid, org_id) DO UPDATE SET
                text = excluded.text,
                weight = excluded.weight",
            rusqlite::params![text, kind, uid, org_id, weight],
        )
        .map_err(|e| index_error("index_add", e))?;
        Ok(())
    }

    fn search(&self, query: &str, org_id: i64) -> Result<Vec<SearchResult>> {
        if tokenize::tokenize(query).is_empty() {
            return Ok(Vec::new());
        }

        let candidates = {
            let conn = self.conn("index_search")?;
            load_org_entries(&conn, org_id)?
        };
        Ok(tokenize::rank(query, candidates))
    }

    fn delete(&self, kind: &str, uid: &str, org_id: i64) -> Result<()> {
        let conn = self.conn("index_delete")?;
        conn.execute(
            "DELETE FROM search_entries WHERE kind = ?1 AND uid = ?2 AND org_id = ?3",
            rusqlite::params![kind, uid, org_id],
        )
        .map_err(|e| index_error("index_delete", e))?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        // The connection belongs to whoever built the handle; only this
        // view of it is shut.
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn load_org_entries(conn: &Connection, org_id: i64) -> Result<Vec<SearchResult>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, text, kind, uid, org_id, weight
             FROM search_entries
             WHERE org_id = ?1
             ORDER BY id",
        )
        .map_err(|e| index_error("index_search", e))?;
    let entries = stmt
        .query_map([org_id], |row| {
            Ok(SearchResult {
                id: row.get(0)?,
                text: row.get(1)?,
                kind: row.get(2)?,
                uid: row.get(3)?,
                org_id: row.get(4)?,
                weight: row.get(5)?,
            })
        })
        .map_err(|e| index_error("index_search", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| index_error("index_search", e))?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrations};

    fn index() -> SqliteSearchIndex {
        let mut conn = db::open_in_memory().unwrap();
        migrations::apply_migrations(&mut conn).unwrap();
        SqliteSearchIndex::new(db::shared(conn))
    }

    #[test]
    fn test_readd_replaces_entry() {
        let index = index();
        index.add("cpu", "snapshot", "k1", 1, 1).unwrap();
        index.add("memory", "snapshot", "k1", 1, 3).unwrap();

        assert!(index.search("cpu", 1).unwrap().is_empty());
        let hits = index.search("memory", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].weight, 3);
    }

    #[test]
    fn test_closed_index_rejects_calls() {
        let index = index();
        index.close().unwrap();
        let err = index.add("cpu", "snapshot", "k1", 1, 1).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Index);
        assert!(index.search("cpu", 1).is_err());
    }
}
