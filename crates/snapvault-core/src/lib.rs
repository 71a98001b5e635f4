//! snapvault core - snapshot model, capability tokens and service contracts
//!
//! This crate provides:
//! - The `Snapshot` model with its `Plain | Encrypted` content variant
//! - Capability token generation (`KeyGenerator`)
//! - Creation command validation (`CreateCommand::build`)
//! - Redaction of delete-capability fields
//! - The `SnapshotStore` and `SearchIndex` contracts, plus an in-memory index
//! - `SnapshotService`, the orchestration over store and index
//! - Error and logging facilities shared by every crate in the workspace

pub mod cipher;
pub mod errors;
pub mod factory;
pub mod keys;
pub mod logging_facility;
pub mod model;
pub mod redaction;
pub mod search;
pub mod service;
pub mod store;

#[doc(hidden)]
pub use snapvault_core_types;

// Re-export commonly used types
pub use cipher::{AesGcmCipher, ContentCipher};
pub use errors::{ExError, ExErrorKind, Result, SnapshotError};
pub use factory::CreateCommand;
pub use keys::{KeyGenerator, TokenSource, KEY_LENGTH};
pub use model::{Snapshot, SnapshotContent};
pub use search::{MemorySearchIndex, SearchIndex, SearchResult, SNAPSHOT_KIND};
pub use service::SnapshotService;
pub use store::{GetByKeyQuery, ListQuery, SnapshotStore};
