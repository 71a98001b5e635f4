//! Error helpers for snapvault-store
//!
//! Wraps the core `ExError` with store-specific constructors. Errors name the
//! failing operation, never the row's capability tokens.

use snapvault_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_entity_id(migration_id)
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Whether a rusqlite error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Map an insert failure: UNIQUE violations become `DuplicateKey`
pub fn from_insert_error(op: &str, err: rusqlite::Error) -> ExError {
    if is_unique_violation(&err) {
        ExError::new(ExErrorKind::DuplicateKey)
            .with_op(op.to_string())
            .with_message("key or delete key already exists")
    } else {
        from_rusqlite(op, err)
    }
}

/// Create a persistence error from rusqlite::Error
pub fn from_rusqlite(op: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

/// Create an index error from rusqlite::Error
pub fn index_error(op: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Index)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(op: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

/// A stored row that violates the schema's own invariants
pub fn corrupt_row(op: &str, snapshot_id: i64, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op.to_string())
        .with_entity_id(snapshot_id.to_string())
        .with_message(reason.to_string())
}
