//! In-process search index

use crate::errors::{lock_poisoned, ExError, ExErrorKind, Result};
use crate::search::{tokenize, SearchIndex, SearchResult};
use std::collections::BTreeMap;
use std::sync::Mutex;

type EntryKey = (String, String, i64);

#[derive(Default)]
struct State {
    next_id: i64,
    entries: BTreeMap<EntryKey, SearchResult>,
    closed: bool,
}

/// `SearchIndex` held entirely in memory; suited to tests and single-process
/// deployments that can rebuild the index on start.
#[derive(Default)]
pub struct MemorySearchIndex {
    state: Mutex<State>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries across all organizations
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_open_state<T>(&self, op: &str, f: impl FnOnce(&mut State) -> T) -> Result<T> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned(op))?;
        if state.closed {
            return Err(index_closed(op));
        }
        Ok(f(&mut state))
    }
}

fn index_closed(op: &str) -> ExError {
    ExError::new(ExErrorKind::Index)
        .with_op(op.to_string())
        .with_message("index is closed")
}

impl SearchIndex for MemorySearchIndex {
    fn add(&self, text: &str, kind: &str, uid: &str, org_id: i64, weight: u32) -> Result<()> {
        self.with_open_state("index_add", |state| {
            let key = (kind.to_string(), uid.to_string(), org_id);
            // Re-adding keeps the entry's index id stable.
            let id = match state.entries.get(&key) {
                Some(existing) => existing.id,
                None => {
                    state.next_id += 1;
                    state.next_id
                }
            };
            state.entries.insert(
                key,
                SearchResult {
                    id,
                    text: text.to_string(),
                    kind: kind.to_string(),
                    uid: uid.to_string(),
                    org_id,
                    weight,
                },
            );
        })
    }

    fn search(&self, query: &str, org_id: i64) -> Result<Vec<SearchResult>> {
        let candidates = self.with_open_state("index_search", |state| {
            state
                .entries
                .values()
                .filter(|r| r.org_id == org_id)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(tokenize::rank(query, candidates))
    }

    fn delete(&self, kind: &str, uid: &str, org_id: i64) -> Result<()> {
        self.with_open_state("index_delete", |state| {
            state
                .entries
                .remove(&(kind.to_string(), uid.to_string(), org_id));
        })
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned("index_close"))?;
        state.entries.clear();
        state.closed = true;
        Ok(())
    }
}
