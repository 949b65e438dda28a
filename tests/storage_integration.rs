//! Integration tests for guarded score persistence.

#![cfg(feature = "sqlite")]

use radarmatch::score::AuditKind;
use radarmatch::storage::{GuardedStore, KeyValueStore, SqliteStore};
use radarmatch::types::config::Config;
use serde_json::{json, Value};
use tempfile::TempDir;

fn read(store: &impl KeyValueStore, key: &str) -> Value {
    serde_json::from_str(&store.get(key).unwrap().unwrap()).unwrap()
}

#[test]
fn test_writes_are_sanitized_before_persisting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.db");
    let config = Config::default_config();

    {
        let mut store = GuardedStore::from_config(SqliteStore::open(&path).unwrap(), &config);
        store
            .set(
                "ai_score_u1_u2",
                &json!({
                    "score": 12,
                    "breakdown": {"emotionalSync": 90, "activityOverlap": 30}
                })
                .to_string(),
            )
            .unwrap();
        assert_eq!(store.validator().audit_log()[0].kind, AuditKind::StorageWrite);
    }

    // Reopen without the guard: the stored payload is already canonical.
    let raw = SqliteStore::open(&path).unwrap();
    let saved = read(&raw, "ai_score_u1_u2");
    assert_eq!(saved["breakdown"]["growthPhaseMatch"], 70);
    assert_eq!(saved["breakdown"]["urgencyAlignment"], 40);
    assert!(saved["breakdown"].get("emotionalSync").is_none());
    assert_eq!(saved["score"], 12);
}

#[test]
fn test_repair_existing_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.db");

    {
        let mut raw = SqliteStore::open(&path).unwrap();
        raw.set("ai_score_old", &json!({"breakdown": {"commonTopics": 20}}).to_string())
            .unwrap();
        raw.set("ai_score_bad", "{{{").unwrap();
        raw.set(
            "ai_score_range",
            &json!({"breakdown": {"businessSynergy": 400}}).to_string(),
        )
        .unwrap();
        raw.set("settings", "{{{").unwrap();
    }

    let mut store =
        GuardedStore::from_config(SqliteStore::open(&path).unwrap(), &Config::default_config());
    assert_eq!(store.repair_all().unwrap(), 3);

    let keys = store.keys("ai_score_").unwrap();
    assert_eq!(keys, vec!["ai_score_old", "ai_score_range"]);
    assert_eq!(read(&store, "ai_score_range")["breakdown"]["businessSynergy"], 100);
    assert_eq!(read(&store, "ai_score_old")["breakdown"]["businessTrends"], 35);
    assert!(store.get("settings").unwrap().is_some());

    let report = store.report();
    assert_eq!(report.total_validations, 2);
    assert_eq!(store.repair_all().unwrap(), 0);
}
