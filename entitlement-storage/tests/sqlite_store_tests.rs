use entitlement_model::{ModelError, RecordStore};
use entitlement_storage::{SqliteStore, StorageError};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Basic operations ─────────────────────────────────────────────

#[test]
fn get_missing_key_is_none() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.get("acme_license").unwrap().is_none());
}

#[test]
fn set_then_get_returns_record() {
    let store = SqliteStore::open_in_memory().unwrap();
    let record = json!({"id": "acme", "status": "active", "usage_count": 2});
    store.set("acme_license", &record).unwrap();
    assert_eq!(store.get("acme_license").unwrap(), Some(record));
}

#[test]
fn set_replaces_whole_record() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .set("acme_license", &json!({"status": "active", "usage_count": 2}))
        .unwrap();
    store.set("acme_license", &json!({"status": "revoked"})).unwrap();
    assert_eq!(
        store.get("acme_license").unwrap(),
        Some(json!({"status": "revoked"}))
    );
}

#[test]
fn delete_removes_record() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set("acme_license", &json!({})).unwrap();
    store.delete("acme_license").unwrap();
    assert!(store.get("acme_license").unwrap().is_none());
}

#[test]
fn delete_missing_key_is_ok() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.delete("ghost_license").is_ok());
}

#[test]
fn keys_are_sorted() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.write("b_license", &json!({})).unwrap();
    store.write("a_license", &json!({})).unwrap();
    assert_eq!(store.keys().unwrap(), vec!["a_license", "b_license"]);
}

#[test]
fn updated_at_tracks_writes() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.updated_at("acme_license").unwrap(), None);
    store.write("acme_license", &json!({})).unwrap();
    assert!(store.updated_at("acme_license").unwrap().unwrap() > 0);
}

#[test]
fn clones_share_the_connection() {
    let store = SqliteStore::open_in_memory().unwrap();
    let other = store.clone();
    store.write("acme_license", &json!({"n": 1})).unwrap();
    assert_eq!(other.read("acme_license").unwrap(), Some(json!({"n": 1})));
}

// ── Durability ───────────────────────────────────────────────────

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.set("acme_license", &json!({"license_id": "L1"})).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(
        store.get("acme_license").unwrap(),
        Some(json!({"license_id": "L1"}))
    );
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn storage_error_converts_to_store_error() {
    let err: ModelError = StorageError::Poisoned.into();
    assert!(matches!(err, ModelError::Store(msg) if msg.contains("poisoned")));
}

#[test]
fn serialization_error_keeps_its_kind() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ModelError = StorageError::Serialization(serde_err).into();
    assert!(matches!(err, ModelError::Serialization(_)));
}
