use super::*;
use serde_json::json;

fn data(pairs: &[(&str, serde_json::Value)]) -> ContextData {
    let mut map = serde_json::Map::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    ContextData(map)
}

#[test]
fn read_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let doc = ContextDocument::new(dir.path().join("panic_context.json"));
    let err = doc.read().unwrap_err();
    assert!(matches!(err, ContextDocError::NotFound(_)));
}

#[test]
fn read_corrupted_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panic_context.json");
    std::fs::write(&path, "{not json").unwrap();
    let doc = ContextDocument::new(path);
    let err = doc.read().unwrap_err();
    assert!(matches!(err, ContextDocError::ParseError { .. }));
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let doc = ContextDocument::new(dir.path().join("panic_context.json"));
    let written = data(&[("panic_location", json!("a:1"))]);
    doc.write(&written).unwrap();

    let read_back = doc.read().unwrap();
    assert_eq!(read_back.get("panic_location"), Some(&json!("a:1")));
    assert!(!dir.path().join("panic_context.json.tmp").exists());
}

#[test]
fn merge_on_absent_file_errors_rather_than_creating() {
    let dir = tempfile::tempdir().unwrap();
    let doc = ContextDocument::new(dir.path().join("panic_context.json"));
    let err = doc
        .merge(&data(&[("failing_seed", json!(42))]))
        .unwrap_err();
    assert!(matches!(err, ContextDocError::NotFound(_)));
}

#[test]
fn merge_overlays_partial_keys_and_preserves_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let doc = ContextDocument::new(dir.path().join("panic_context.json"));
    doc.write(&data(&[
        ("panic_location", json!("a:1")),
        ("panic_message", json!("assertion failed")),
        ("some_unknown_field", json!("keep me")),
    ]))
    .unwrap();

    let merged = doc
        .merge(&data(&[("failing_seed", json!(42))]))
        .unwrap();
    assert_eq!(merged.get("panic_location"), Some(&json!("a:1")));
    assert_eq!(merged.get("failing_seed"), Some(&json!(42)));
    assert_eq!(merged.get("some_unknown_field"), Some(&json!("keep me")));

    let reread = doc.read().unwrap();
    assert_eq!(reread.get("failing_seed"), Some(&json!(42)));
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panic_context.json");
    let doc = ContextDocument::new(path.clone());
    doc.write(&data(&[("panic_location", json!("a:1"))])).unwrap();
    doc.delete().unwrap();
    assert!(!path.exists());
    doc.delete().unwrap();
}

#[test]
fn validate_for_phase_delegates_to_core() {
    let complete = data(&[
        ("panic_location", json!("a:1")),
        ("panic_message", json!("assertion failed")),
        ("tcl_test_file", json!("test.tcl")),
    ]);
    let result = validate_for_phase(&complete, ValidationPhase::RepoSetup);
    assert!(result.valid);
}
