#![allow(clippy::unwrap_used, clippy::expect_used)]

// Content encryption at rest

use chrono::{TimeZone, Utc};
use serde_json::json;
use snapvault_core::store::{GetByKeyQuery, ListQuery, SnapshotStore};
use snapvault_core::{
    AesGcmCipher, CreateCommand, ExErrorKind, KeyGenerator, MemorySearchIndex, SnapshotContent,
};
use snapvault_store::{db, migrations, DbHandle, SqliteSnapshotStore, StoreOptions};
use std::sync::Arc;

const HEX_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

fn shared_db() -> DbHandle {
    let mut conn = db::open_in_memory().unwrap();
    migrations::apply_migrations(&mut conn).unwrap();
    db::shared(conn)
}

fn encrypted_store(db: DbHandle, hex_key: &str) -> SqliteSnapshotStore {
    let cipher = Arc::new(AesGcmCipher::from_hex(hex_key).unwrap());
    SqliteSnapshotStore::with_options(
        db,
        Arc::new(MemorySearchIndex::new()),
        StoreOptions::default().with_cipher(cipher),
    )
}

fn create(store: &SqliteSnapshotStore) -> String {
    let snap = CreateCommand::new(1, 7, json!({"secret": "panel"}))
        .with_name("encrypted")
        .build(Utc.timestamp_opt(1_700_000_000, 0).unwrap(), &KeyGenerator::new())
        .unwrap();
    store.create(snap).unwrap().key
}

#[test]
fn test_content_stored_encrypted_and_read_back_plain() {
    let db = shared_db();
    let store = encrypted_store(db.clone(), HEX_KEY);
    let key = create(&store);

    // The row holds only ciphertext
    let (plain, encrypted): (Option<String>, Option<Vec<u8>>) = db
        .lock()
        .unwrap()
        .query_row(
            "SELECT dashboard, dashboard_encrypted FROM dashboard_snapshots WHERE key = ?1",
            [&key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert!(plain.is_none());
    let encrypted = encrypted.unwrap();
    assert!(!String::from_utf8_lossy(&encrypted).contains("panel"));

    let fetched = store.get_by_key(&GetByKeyQuery::new(&key)).unwrap();
    assert_eq!(fetched.content, SnapshotContent::Plain(json!({"secret": "panel"})));
}

#[test]
fn test_list_decrypts() {
    let store = encrypted_store(shared_db(), HEX_KEY);
    create(&store);

    let listed = store.list(&ListQuery::new(1, 10)).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].content.is_encrypted());
}

#[test]
fn test_without_cipher_encrypted_rows_stay_opaque() {
    let db = shared_db();
    let key = create(&encrypted_store(db.clone(), HEX_KEY));

    let plain_store = SqliteSnapshotStore::new(db, Arc::new(MemorySearchIndex::new()));
    let fetched = plain_store.get_by_key(&GetByKeyQuery::new(&key)).unwrap();
    assert!(fetched.content.is_encrypted());
}

#[test]
fn test_wrong_key_fails_with_crypto_error() {
    let db = shared_db();
    let key = create(&encrypted_store(db.clone(), HEX_KEY));

    let other = "ff".repeat(32);
    let err = encrypted_store(db, &other)
        .get_by_key(&GetByKeyQuery::new(&key))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Crypto);
}
