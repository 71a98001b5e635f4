//! Database connection management

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A connection shared between the snapshot store and index backends.
///
/// Holders must release the lock before calling into another holder.
pub type DbHandle = Arc<Mutex<Connection>>;

/// Default time a statement waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open a SQLite database at the given path, creating parent directories
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| crate::errors::io_error("open_db", e))?;
    }
    Connection::open(path).map_err(|e| from_rusqlite("open_db", e))
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(|e| from_rusqlite("open_db", e))
}

/// Configure a connection: WAL journaling, foreign keys and a bounded busy wait
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)
        .map_err(|e| from_rusqlite("configure_db", e))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| from_rusqlite("configure_db", e))?;

    // journal_mode answers with the resulting mode ("memory" for in-memory dbs)
    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|e| from_rusqlite("configure_db", e))?;

    Ok(())
}

/// Wrap a configured connection for sharing
pub fn shared(conn: Connection) -> DbHandle {
    Arc::new(Mutex::new(conn))
}
