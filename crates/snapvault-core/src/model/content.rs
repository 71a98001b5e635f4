//! Snapshot content: either a plain document or an encrypted payload.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// The captured dashboard document.
///
/// Exactly one representation exists at a time. On the wire the variant name
/// is the JSON key (`dashboard` or `dashboardEncrypted`), matching the flat
/// layout outer clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotContent {
    /// Opaque structured document (map/array/scalar tree)
    #[serde(rename = "dashboard")]
    Plain(serde_json::Value),
    /// Ciphertext produced by a `ContentCipher`, base64 on the wire
    #[serde(rename = "dashboardEncrypted", with = "base64_bytes")]
    Encrypted(Vec<u8>),
}

impl SnapshotContent {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, SnapshotContent::Encrypted(_))
    }

    /// The plain document, if this content is not encrypted
    pub fn as_plain(&self) -> Option<&serde_json::Value> {
        match self {
            SnapshotContent::Plain(doc) => Some(doc),
            SnapshotContent::Encrypted(_) => None,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_payload(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Base64 text of an encrypted payload, as it appears on the wire
pub fn encode_payload(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_serializes_under_dashboard_key() {
        let content = SnapshotContent::Plain(json!({"panels": []}));
        let v = serde_json::to_value(&content).unwrap();
        assert_eq!(v, json!({"dashboard": {"panels": []}}));
    }

    #[test]
    fn test_encrypted_serializes_as_base64() {
        let content = SnapshotContent::Encrypted(vec![1, 2, 3]);
        let v = serde_json::to_value(&content).unwrap();
        assert_eq!(v, json!({"dashboardEncrypted": "AQID"}));

        let back: SnapshotContent = serde_json::from_value(v).unwrap();
        assert_eq!(back, content);
    }

    #[test]
    fn test_as_plain() {
        assert!(SnapshotContent::Encrypted(vec![9]).as_plain().is_none());
        assert_eq!(
            SnapshotContent::Plain(json!(1)).as_plain(),
            Some(&json!(1))
        );
    }
}
