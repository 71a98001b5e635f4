//! Subcommand implementations

pub mod migrate;
pub mod search;
pub mod snapshot;

use crate::config::SnapvaultConfig;
use serde::Serialize;
use snapvault_core::{KeyGenerator, Result, SnapshotService};
use snapvault_store::{db, migrations, SqliteSearchIndex, SqliteSnapshotStore, StoreOptions};
use std::sync::Arc;

/// Open the configured database, bring its schema up to date and wire the
/// service over it
pub(crate) fn open_service(config: &SnapvaultConfig) -> Result<SnapshotService> {
    let mut conn = db::open(&config.db_path)?;
    db::configure(&conn, config.busy_timeout())?;
    migrations::apply_migrations(&mut conn)?;

    let db = db::shared(conn);
    let index = Arc::new(SqliteSearchIndex::new(db.clone()));

    let mut options = StoreOptions::default().with_index_weight(config.index_weight);
    if let Some(cipher) = config.cipher()? {
        options = options.with_cipher(Arc::new(cipher));
    }
    let store = Arc::new(SqliteSnapshotStore::with_options(db, index.clone(), options));

    Ok(SnapshotService::new(store, index, Arc::new(KeyGenerator::new())))
}

/// Print `value` to stdout as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
