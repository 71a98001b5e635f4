//! Snapshot service: the command surface over store and index
//!
//! Every operation runs inside a span carrying a fresh `request_id`, emits
//! start/end events through the logging facility, and tags returned errors
//! with the request id.

use crate::errors::{ExErrorKind, Result};
use crate::factory::CreateCommand;
use crate::keys::TokenSource;
use crate::model::Snapshot;
use crate::search::{SearchIndex, SearchResult};
use crate::store::{GetByKeyQuery, ListQuery, SnapshotStore};
use crate::{log_op_end, log_op_error, log_op_start};
use chrono::{DateTime, Utc};
use snapvault_core_types::RequestId;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates creation, lookup, deletion and search
pub struct SnapshotService {
    store: Arc<dyn SnapshotStore>,
    index: Arc<dyn SearchIndex>,
    tokens: Arc<dyn TokenSource>,
}

impl SnapshotService {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        index: Arc<dyn SearchIndex>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            store,
            index,
            tokens,
        }
    }

    /// Validate, build and persist a snapshot
    ///
    /// A duplicate-key failure on generated tokens is retried once with fresh
    /// tokens. Caller-supplied tokens are never replaced.
    ///
    /// # Errors
    ///
    /// `InvalidInput`, `RandomSource`, `DuplicateKey` or `Persistence`.
    pub fn create(&self, cmd: &CreateCommand, now: DateTime<Utc>) -> Result<Snapshot> {
        self.run("create_snapshot", || {
            let snapshot = cmd.build(now, self.tokens.as_ref())?;
            match self.store.create(snapshot) {
                Err(e) if e.kind() == ExErrorKind::DuplicateKey && cmd.generates_keys() => {
                    tracing::warn!(
                        op = "create_snapshot",
                        err_code = e.code(),
                        "generated key collided, regenerating once"
                    );
                    let retry = cmd.build(now, self.tokens.as_ref())?;
                    self.store.create(retry)
                }
                other => other,
            }
        })
    }

    /// # Errors
    ///
    /// `NotFound` or `Persistence`.
    pub fn get(&self, query: &GetByKeyQuery) -> Result<Snapshot> {
        self.run("get_snapshot", || self.store.get_by_key(query))
    }

    /// # Errors
    ///
    /// `Persistence`.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Snapshot>> {
        self.run("list_snapshots", || self.store.list(query))
    }

    /// # Errors
    ///
    /// `Persistence`.
    pub fn delete(&self, delete_key: &str) -> Result<bool> {
        self.run("delete_snapshot", || self.store.delete_by_delete_key(delete_key))
    }

    /// # Errors
    ///
    /// `Persistence`.
    pub fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.run("delete_expired", || self.store.delete_expired(now))
    }

    /// Query the search index within an organization
    ///
    /// # Errors
    ///
    /// `Index` when the backend fails.
    pub fn search(&self, query: &str, org_id: i64) -> Result<Vec<SearchResult>> {
        self.run("search_snapshots", || self.index.search(query, org_id))
    }

    fn run<T>(&self, op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let request_id = RequestId::new();
        let span = tracing::info_span!("snapvault_op", request_id = %request_id);
        let _guard = span.enter();

        let started = Instant::now();
        log_op_start!(op);

        match f() {
            Ok(value) => {
                log_op_end!(op, duration_ms = started.elapsed().as_millis() as u64);
                Ok(value)
            }
            Err(e) => {
                log_op_error!(op, e, duration_ms = started.elapsed().as_millis() as u64);
                Err(e.with_request_id(request_id))
            }
        }
    }
}
