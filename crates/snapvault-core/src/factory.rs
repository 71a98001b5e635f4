//! Snapshot creation command and its validation
//!
//! `CreateCommand::build` turns a request into a fully populated, not yet
//! persisted `Snapshot`. It never touches storage.

use crate::errors::{ExError, Result, SnapshotError};
use crate::keys::{generate_distinct, generate_key_pair, TokenSource};
use crate::model::{Snapshot, SnapshotContent, DEFAULT_SNAPSHOT_NAME};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Deserialize;

/// Request to create a snapshot.
///
/// Deserializes from the public create payload. `orgId`, `userId` and the
/// external URLs are never read from it; the caller's authentication and
/// API layers fill them in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommand {
    #[serde(default)]
    pub name: String,
    /// Lifetime in seconds; `0` means the snapshot never expires
    #[serde(default, rename = "expires")]
    pub expires_seconds: i64,
    #[serde(default)]
    pub external: bool,
    #[serde(skip)]
    pub external_url: String,
    #[serde(skip)]
    pub external_delete_url: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub delete_key: String,
    #[serde(skip)]
    pub org_id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub dashboard: Option<serde_json::Value>,
}

impl CreateCommand {
    /// Start a command for `org_id`/`user_id` capturing `dashboard`
    pub fn new(org_id: i64, user_id: i64, dashboard: serde_json::Value) -> Self {
        Self {
            org_id,
            user_id,
            dashboard: Some(dashboard),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_expires_seconds(mut self, seconds: i64) -> Self {
        self.expires_seconds = seconds;
        self
    }

    /// Mark as hosted elsewhere; the external host supplies both tokens
    pub fn with_external(
        mut self,
        external_url: impl Into<String>,
        external_delete_url: impl Into<String>,
    ) -> Self {
        self.external = true;
        self.external_url = external_url.into();
        self.external_delete_url = external_delete_url.into();
        self
    }

    pub fn with_keys(mut self, key: impl Into<String>, delete_key: impl Into<String>) -> Self {
        self.key = key.into();
        self.delete_key = delete_key.into();
        self
    }

    /// Check the command without building anything
    pub fn validate(&self) -> std::result::Result<(), SnapshotError> {
        match &self.dashboard {
            None | Some(serde_json::Value::Null) => return Err(SnapshotError::DashboardRequired),
            Some(_) => {}
        }

        if self.external {
            if self.key.is_empty() {
                return Err(SnapshotError::ExternalKeyRequired);
            }
            if self.delete_key.is_empty() {
                return Err(SnapshotError::ExternalDeleteKeyRequired);
            }
        }

        if !self.key.is_empty() && self.key == self.delete_key {
            return Err(SnapshotError::KeysNotDistinct);
        }

        if self.expires_seconds < 0 {
            return Err(SnapshotError::NegativeExpiry {
                expires_seconds: self.expires_seconds,
            });
        }

        Ok(())
    }

    /// Whether any token will be generated by `build`
    ///
    /// Only generated tokens may be regenerated after a duplicate-key
    /// failure; caller-supplied ones are surfaced as-is.
    pub fn generates_keys(&self) -> bool {
        self.key.is_empty() || self.delete_key.is_empty()
    }

    /// Validate and materialize the snapshot
    ///
    /// `now` is truncated to millisecond precision, the resolution of
    /// persisted timestamps, so a built snapshot compares equal to the row
    /// read back from storage.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for any validation failure
    /// - `RandomSource` if a token cannot be generated
    pub fn build(&self, now: DateTime<Utc>, tokens: &dyn TokenSource) -> Result<Snapshot> {
        self.validate()
            .map_err(|e| ExError::from(e).with_op("build_snapshot"))?;

        let now = now.trunc_subsecs(3);

        let expires = match self.expires_seconds {
            0 => None,
            secs => {
                let expires = Duration::try_seconds(secs)
                    .and_then(|d| now.checked_add_signed(d))
                    .ok_or_else(|| {
                        ExError::from(SnapshotError::ExpiryOutOfRange {
                            expires_seconds: secs,
                        })
                        .with_op("build_snapshot")
                    })?;
                Some(expires)
            }
        };

        let name = if self.name.is_empty() {
            DEFAULT_SNAPSHOT_NAME.to_string()
        } else {
            self.name.clone()
        };

        // validate() already rejected equal supplied keys
        let (key, delete_key) = match (self.key.is_empty(), self.delete_key.is_empty()) {
            (true, true) => generate_key_pair(tokens)?,
            (true, false) => (
                generate_distinct(tokens, &self.delete_key)?,
                self.delete_key.clone(),
            ),
            (false, true) => (self.key.clone(), generate_distinct(tokens, &self.key)?),
            (false, false) => (self.key.clone(), self.delete_key.clone()),
        };

        // External URLs only describe snapshots hosted elsewhere
        let (external_url, external_delete_url) = if self.external {
            (self.external_url.clone(), self.external_delete_url.clone())
        } else {
            (String::new(), String::new())
        };

        let dashboard = self
            .dashboard
            .clone()
            .ok_or_else(|| ExError::from(SnapshotError::DashboardRequired))?;

        Ok(Snapshot {
            id: 0,
            name,
            key,
            delete_key,
            org_id: self.org_id,
            user_id: self.user_id,
            external: self.external,
            external_url,
            external_delete_url,
            expires,
            created: now,
            updated: now,
            content: SnapshotContent::Plain(dashboard),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::keys::KeyGenerator;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_deserialize_public_payload() {
        let cmd: CreateCommand = serde_json::from_value(json!({
            "name": "demo",
            "expires": 3600,
            "dashboard": {"title": "CPU"}
        }))
        .unwrap();

        assert_eq!(cmd.name, "demo");
        assert_eq!(cmd.expires_seconds, 3600);
        assert!(!cmd.external);
        assert!(cmd.dashboard.is_some());
    }

    #[test]
    fn test_deserialize_ignores_caller_owned_fields() {
        let cmd: CreateCommand = serde_json::from_value(json!({
            "orgId": 99,
            "userId": 42,
            "externalUrl": "https://evil/s/1",
            "externalDeleteUrl": "https://evil/d/1",
            "dashboard": {}
        }))
        .unwrap();

        assert_eq!(cmd.org_id, 0);
        assert_eq!(cmd.user_id, 0);
        assert!(cmd.external_url.is_empty());
        assert!(cmd.external_delete_url.is_empty());
    }

    #[test]
    fn test_null_dashboard_is_absent() {
        let cmd = CreateCommand::new(1, 1, serde_json::Value::Null);
        assert_eq!(cmd.validate(), Err(SnapshotError::DashboardRequired));
    }

    #[test]
    fn test_build_truncates_to_millis() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let snap = CreateCommand::new(1, 1, json!({}))
            .build(now, &KeyGenerator::new())
            .unwrap();
        assert_eq!(snap.created.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_overflowing_expiry_rejected() {
        let err = CreateCommand::new(1, 1, json!({}))
            .with_expires_seconds(i64::MAX)
            .build(t0(), &KeyGenerator::new())
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_generates_keys() {
        let cmd = CreateCommand::new(1, 1, json!({}));
        assert!(cmd.generates_keys());
        assert!(!cmd.with_keys("a", "b").generates_keys());
    }
}
