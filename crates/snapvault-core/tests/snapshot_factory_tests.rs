#![allow(clippy::unwrap_used, clippy::expect_used)]

// Creation command validation, defaults and expiry arithmetic

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;
use snapvault_core::errors::ExErrorKind;
use snapvault_core::keys::{is_well_formed, KeyGenerator, TokenSource};
use snapvault_core::model::DEFAULT_SNAPSHOT_NAME;
use snapvault_core::{CreateCommand, ExError, SnapshotContent};
use std::sync::Mutex;

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Hands out scripted tokens in order
struct Scripted(Mutex<Vec<&'static str>>);

impl Scripted {
    fn new(tokens: &[&'static str]) -> Self {
        let mut v = tokens.to_vec();
        v.reverse();
        Self(Mutex::new(v))
    }
}

impl TokenSource for Scripted {
    fn generate(&self, _length: usize) -> snapvault_core::Result<String> {
        Ok(self.0.lock().unwrap().pop().expect("script exhausted").to_string())
    }
}

struct BrokenEntropy;

impl TokenSource for BrokenEntropy {
    fn generate(&self, _length: usize) -> snapvault_core::Result<String> {
        Err(ExError::new(ExErrorKind::RandomSource).with_message("entropy unavailable"))
    }
}

#[test]
fn test_demo_scenario() {
    // Given: {name:"demo", expiresSeconds:60, dashboard:{"a":1}, orgID:1, userID:7} at T0
    let cmd = CreateCommand::new(1, 7, json!({"a": 1}))
        .with_name("demo")
        .with_expires_seconds(60);

    let snap = cmd.build(t0(), &KeyGenerator::new()).unwrap();

    assert_eq!(snap.id, 0);
    assert_eq!(snap.name, "demo");
    assert_eq!(snap.org_id, 1);
    assert_eq!(snap.user_id, 7);
    assert_eq!(snap.created, t0());
    assert_eq!(snap.updated, t0());
    assert_eq!(snap.expires, Some(t0() + Duration::seconds(60)));
    assert!(!snap.key.is_empty());
    assert!(!snap.delete_key.is_empty());
    assert_ne!(snap.key, snap.delete_key);
    assert!(is_well_formed(&snap.key));
    assert_eq!(snap.content, SnapshotContent::Plain(json!({"a": 1})));
}

#[test]
fn test_missing_dashboard_rejected() {
    let cmd = CreateCommand {
        org_id: 1,
        ..CreateCommand::default()
    };
    let err = cmd.build(t0(), &KeyGenerator::new()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(err.message(), "dashboard required");
}

#[test]
fn test_external_requires_key() {
    let cmd = CreateCommand::new(1, 1, json!({}))
        .with_external("https://ext/s/abc", "https://ext/d/abc")
        .with_keys("", "dk");
    let err = cmd.build(t0(), &KeyGenerator::new()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(err.message(), "key required for external snapshot");
}

#[test]
fn test_external_requires_delete_key() {
    let cmd = CreateCommand::new(1, 1, json!({}))
        .with_external("https://ext/s/abc", "https://ext/d/abc")
        .with_keys("k", "");
    let err = cmd.build(t0(), &KeyGenerator::new()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(err.message(), "deleteKey required for external snapshot");
}

#[test]
fn test_external_keeps_supplied_tokens_and_urls() {
    let cmd = CreateCommand::new(1, 1, json!({}))
        .with_external("https://ext/s/abc", "https://ext/d/xyz")
        .with_keys("abc", "xyz");
    let snap = cmd.build(t0(), &BrokenEntropy).unwrap();

    assert!(snap.external);
    assert_eq!(snap.key, "abc");
    assert_eq!(snap.delete_key, "xyz");
    assert_eq!(snap.external_url, "https://ext/s/abc");
    assert_eq!(snap.external_delete_url, "https://ext/d/xyz");
}

#[test]
fn test_urls_dropped_when_not_external() {
    let mut cmd = CreateCommand::new(1, 1, json!({}));
    cmd.external_url = "https://ext/s/abc".to_string();
    cmd.external_delete_url = "https://ext/d/xyz".to_string();

    let snap = cmd.build(t0(), &KeyGenerator::new()).unwrap();

    assert!(!snap.external);
    assert!(snap.external_url.is_empty());
    assert!(snap.external_delete_url.is_empty());
}

#[test]
fn test_payload_cannot_set_owner_or_urls() {
    let cmd: CreateCommand = serde_json::from_value(json!({
        "name": "demo",
        "orgId": 99,
        "userId": 42,
        "external": false,
        "externalUrl": "https://ext/s/abc",
        "externalDeleteUrl": "https://ext/d/xyz",
        "dashboard": {"a": 1}
    }))
    .unwrap();

    let snap = CreateCommand {
        org_id: 1,
        user_id: 7,
        ..cmd
    }
    .build(t0(), &KeyGenerator::new())
    .unwrap();

    assert_eq!(snap.org_id, 1);
    assert_eq!(snap.user_id, 7);
    assert!(snap.external_url.is_empty());
    assert!(snap.external_delete_url.is_empty());
}

#[test]
fn test_empty_name_defaults() {
    let snap = CreateCommand::new(1, 1, json!({}))
        .build(t0(), &KeyGenerator::new())
        .unwrap();
    assert_eq!(snap.name, DEFAULT_SNAPSHOT_NAME);
}

#[test]
fn test_zero_expiry_never_expires() {
    let snap = CreateCommand::new(1, 1, json!({}))
        .build(t0(), &KeyGenerator::new())
        .unwrap();
    assert_eq!(snap.expires, None);
    assert!(!snap.is_expired(t0() + Duration::days(365 * 100)));
}

#[test]
fn test_negative_expiry_rejected() {
    let err = CreateCommand::new(1, 1, json!({}))
        .with_expires_seconds(-5)
        .build(t0(), &KeyGenerator::new())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_equal_supplied_keys_rejected() {
    let err = CreateCommand::new(1, 1, json!({}))
        .with_keys("same", "same")
        .build(t0(), &KeyGenerator::new())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_generated_collision_regenerates_delete_key() {
    let tokens = Scripted::new(&["AAAA", "AAAA", "BBBB"]);
    let snap = CreateCommand::new(1, 1, json!({}))
        .build(t0(), &tokens)
        .unwrap();
    assert_eq!(snap.key, "AAAA");
    assert_eq!(snap.delete_key, "BBBB");
}

#[test]
fn test_generated_pair_gives_up_on_stuck_source() {
    let tokens = Scripted::new(&["AAAA", "AAAA", "AAAA", "AAAA"]);
    let err = CreateCommand::new(1, 1, json!({}))
        .build(t0(), &tokens)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::RandomSource);
    assert_eq!(err.op(), Some("generate_key_pair"));
}

#[test]
fn test_generated_half_avoids_supplied_partner() {
    let tokens = Scripted::new(&["supplied", "OTHER"]);
    let snap = CreateCommand::new(1, 1, json!({}))
        .with_keys("supplied", "")
        .build(t0(), &tokens)
        .unwrap();
    assert_eq!(snap.delete_key, "OTHER");
}

#[test]
fn test_random_source_failure_is_fatal() {
    let err = CreateCommand::new(1, 1, json!({}))
        .build(t0(), &BrokenEntropy)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::RandomSource);
}

#[test]
fn test_only_missing_half_is_generated() {
    let tokens = Scripted::new(&["GENERATED"]);
    let snap = CreateCommand::new(1, 1, json!({}))
        .with_keys("supplied", "")
        .build(t0(), &tokens)
        .unwrap();
    assert_eq!(snap.key, "supplied");
    assert_eq!(snap.delete_key, "GENERATED");
}

proptest! {
    #[test]
    fn prop_valid_commands_get_distinct_keys(
        name in "[a-zA-Z ]{0,20}",
        expires in 0i64..10_000_000,
        org in 1i64..1000,
    ) {
        let snap = CreateCommand::new(org, 1, json!({"p": 1}))
            .with_name(name)
            .with_expires_seconds(expires)
            .build(t0(), &KeyGenerator::new())
            .unwrap();

        prop_assert!(!snap.key.is_empty());
        prop_assert!(!snap.delete_key.is_empty());
        prop_assert_ne!(&snap.key, &snap.delete_key);
        prop_assert!(!snap.name.is_empty());
        match snap.expires {
            None => prop_assert_eq!(expires, 0),
            Some(e) => {
                prop_assert!(e > snap.created);
                prop_assert_eq!(e, t0() + Duration::seconds(expires));
            }
        }
    }

    #[test]
    fn prop_external_without_tokens_rejected(key_missing in any::<bool>()) {
        let (key, delete_key) = if key_missing { ("", "dk") } else { ("k", "") };
        let err = CreateCommand::new(1, 1, json!({}))
            .with_external("u", "d")
            .with_keys(key, delete_key)
            .build(t0(), &KeyGenerator::new())
            .unwrap_err();
        prop_assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }
}
