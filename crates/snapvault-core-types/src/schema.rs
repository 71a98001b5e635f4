//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent across the logging macros,
//! the test capture layer and ad-hoc `tracing` calls.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_ORG_ID: &str = "org_id";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_INDEX_INCONSISTENT: &str = "index_inconsistent";
