//! Redaction of delete-capability fields
//!
//! A caller who only proved possession of the read `key` must never see the
//! `delete_key` or the external delete URL in a response.

use crate::model::Snapshot;

impl Snapshot {
    /// Clear `delete_key` and `external_delete_url` in place. Idempotent.
    pub fn redact(&mut self) {
        self.delete_key.clear();
        self.external_delete_url.clear();
    }

    /// Consume and return the redacted snapshot
    pub fn into_redacted(mut self) -> Self {
        self.redact();
        self
    }
}

/// Apply redaction unless the caller is entitled to secrets
pub fn apply(snapshot: Snapshot, include_secrets: bool) -> Snapshot {
    if include_secrets {
        snapshot
    } else {
        snapshot.into_redacted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotContent;
    use chrono::Utc;

    fn external_snapshot() -> Snapshot {
        let now = Utc::now();
        Snapshot {
            id: 1,
            name: "ext".to_string(),
            key: "k".to_string(),
            delete_key: "dk".to_string(),
            org_id: 1,
            user_id: 1,
            external: true,
            external_url: "https://snapshots.example/dashboard/snapshot/k".to_string(),
            external_delete_url: "https://snapshots.example/api/snapshots-delete/dk".to_string(),
            expires: None,
            created: now,
            updated: now,
            content: SnapshotContent::Plain(serde_json::json!({})),
        }
    }

    #[test]
    fn test_redact_clears_only_delete_capabilities() {
        let mut s = external_snapshot();
        s.redact();
        assert!(s.delete_key.is_empty());
        assert!(s.external_delete_url.is_empty());
        assert_eq!(s.key, "k");
        assert!(!s.external_url.is_empty());
        assert!(!s.has_secrets());
    }

    #[test]
    fn test_apply_respects_include_secrets() {
        assert!(apply(external_snapshot(), true).has_secrets());
        assert!(!apply(external_snapshot(), false).has_secrets());
    }
}
