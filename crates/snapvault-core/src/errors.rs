use snapvault_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and mapping onto an outer API's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Bad input; the caller's fault
    InvalidInput,
    /// No matching record, or a capability token that does not match.
    /// The two cases are deliberately indistinguishable.
    NotFound,
    /// A key or delete key collided with an existing row
    DuplicateKey,
    /// Storage layer failure; safe for the caller to retry
    Persistence,
    /// The OS entropy source failed; snapshots cannot be created
    RandomSource,
    /// Search index notification failure; never fails a store operation
    Index,
    Serialization,
    Crypto,
    Config,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::DuplicateKey => "ERR_DUPLICATE_KEY",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::RandomSource => "ERR_RANDOM_SOURCE",
            ExErrorKind::Index => "ERR_INDEX",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Crypto => "ERR_CRYPTO",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::Persistence)
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus optional
/// context. `op` names the failing operation; rows are never identified by
/// their capability tokens.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (numeric snapshot id, org id, migration id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised while validating and materializing snapshots
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("dashboard required")]
    DashboardRequired,

    #[error("key required for external snapshot")]
    ExternalKeyRequired,

    #[error("deleteKey required for external snapshot")]
    ExternalDeleteKeyRequired,

    #[error("key and deleteKey must differ")]
    KeysNotDistinct,

    #[error("expiresSeconds must not be negative: {expires_seconds}")]
    NegativeExpiry { expires_seconds: i64 },

    #[error("expiresSeconds out of range: {expires_seconds}")]
    ExpiryOutOfRange { expires_seconds: i64 },

    #[error("snapshot not found")]
    NotFound,

    #[error("random source unavailable: {reason}")]
    RandomSource { reason: String },
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        let kind = match &err {
            SnapshotError::DashboardRequired
            | SnapshotError::ExternalKeyRequired
            | SnapshotError::ExternalDeleteKeyRequired
            | SnapshotError::KeysNotDistinct
            | SnapshotError::NegativeExpiry { .. }
            | SnapshotError::ExpiryOutOfRange { .. } => ExErrorKind::InvalidInput,
            SnapshotError::NotFound => ExErrorKind::NotFound,
            SnapshotError::RandomSource { .. } => ExErrorKind::RandomSource,
        };
        ExError::new(kind).with_message(err.to_string())
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

/// Map a poisoned lock into an internal error
pub fn lock_poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("lock poisoned")
}
