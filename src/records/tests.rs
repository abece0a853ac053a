//! Tests for the lock record model.

use super::*;
use crate::error::CoopLockError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeSet, HashSet};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn resources(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn record(operation_id: &str, paths: &[&str]) -> LockRecord {
    LockRecord {
        operation_id: operation_id.to_string(),
        client_id: "host-000001".to_string(),
        operation_type: OperationType::Delete,
        operation_time: at(0),
        lock_expiration: at(120),
        resources: resources(paths),
    }
}

#[test]
fn test_record_identity_ignores_client_and_timestamps() {
    let a = record("op-1", &["dir/a"]);
    let mut b = a.clone();
    b.client_id = "other-654321".to_string();
    b.lock_expiration = at(600);
    b.operation_type = OperationType::Rename;

    assert_eq!(a, b);

    let set: HashSet<LockRecord> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_record_identity_includes_resources() {
    assert_ne!(record("op-1", &["dir/a"]), record("op-1", &["dir/b"]));
    assert_ne!(record("op-1", &["dir/a"]), record("op-2", &["dir/a"]));
}

#[test]
fn test_record_expiration() {
    let r = record("op-1", &["dir/a"]);
    assert!(!r.is_expired(at(119)));
    assert!(r.is_expired(at(120)));
    assert!(r.is_expired(at(121)));
}

#[test]
fn test_covers_any() {
    let r = record("op-1", &["dir/a", "dir/b"]);
    assert!(r.covers_any(&resources(&["dir/b", "dir/c"])));
    assert!(!r.covers_any(&resources(&["dir/", "dir/c"])));
}

#[test]
fn test_record_display() {
    let display = record("op-1", &["dir/a", "dir/b"]).to_string();
    assert!(display.contains("op-1"));
    assert!(display.contains("DELETE"));
    assert!(display.contains("dir/a, dir/b"));
}

#[test]
fn test_operation_type_parsing() {
    assert_eq!(OperationType::from_str("delete"), Some(OperationType::Delete));
    assert_eq!(OperationType::from_str("RENAME"), Some(OperationType::Rename));
    assert_eq!(OperationType::from_str("copy"), None);
}

#[test]
fn test_wire_format_field_names() {
    let mut set = LockRecordSet::new();
    set.locks.push(record("op-1", &["dir/a"]));

    let json = set.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["formatVersion"], 1);
    let lock = &value["locks"][0];
    assert_eq!(lock["operationId"], "op-1");
    assert_eq!(lock["clientId"], "host-000001");
    assert_eq!(lock["operationType"], "DELETE");
    assert_eq!(lock["operationTime"], "2023-11-14T22:13:20Z");
    assert_eq!(lock["lockExpiration"], "2023-11-14T22:15:20Z");
    assert_eq!(lock["resources"], serde_json::json!(["dir/a"]));
}

#[test]
fn test_parse_record_set_written_elsewhere() {
    let json = r#"{
        "formatVersion": 1,
        "locks": [{
            "operationId": "op-9",
            "clientId": "worker-7.example.com-042137",
            "operationType": "RENAME",
            "operationTime": "2026-10-19T08:00:00.123Z",
            "lockExpiration": "2026-10-19T08:02:00.123Z",
            "resources": ["src/", "dst/"]
        }]
    }"#;

    let set = LockRecordSet::from_json(json).unwrap();
    assert_eq!(set.len(), 1);
    let r = set.find_operation("op-9").unwrap();
    assert_eq!(r.operation_type, OperationType::Rename);
    assert_eq!(r.resources, resources(&["dst/", "src/"]));
    assert_eq!(r.lock_expiration - r.operation_time, Duration::minutes(2));
}

#[test]
fn test_missing_locks_field_is_empty() {
    let set = LockRecordSet::from_json(r#"{"formatVersion": 1}"#).unwrap();
    assert!(set.is_empty());
}

#[test]
fn test_format_version_mismatch_is_consistency_error() {
    let err = LockRecordSet::from_json(r#"{"formatVersion": 2, "locks": []}"#).unwrap_err();
    assert!(matches!(err, CoopLockError::Consistency(_)));
    assert!(err.to_string().contains("expected 1, but was 2"));
}

#[test]
fn test_malformed_record_set_is_consistency_error() {
    let err = LockRecordSet::from_json("{\"locks\": 5").unwrap_err();
    assert!(matches!(err, CoopLockError::Consistency(_)));
}

#[test]
fn test_new_record_set_is_versioned_and_empty() {
    let set = LockRecordSet::default();
    assert_eq!(set.format_version, FORMAT_VERSION);
    assert!(set.is_empty());
    assert!(set.find_operation("op-1").is_none());
}

#[test]
fn test_lock_file_constants() {
    assert_eq!(LOCK_PATH, "_lock/all.lock");
    assert_eq!(LOCK_METADATA_KEY, "lock");
}
