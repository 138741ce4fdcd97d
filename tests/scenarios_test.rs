//! End-to-end behavior of the validation context: version resolution,
//! reference loops, dangling pointers and per-lineage loop detection.

use serde_json::{json, Value};
use waymark::{EngineError, JsonPointer, SchemaEngine, SchemaVersion};

#[test]
fn test_string_schema_accepts_string() {
    let engine = SchemaEngine::new();
    let report = engine
        .validate(json!({"type": "string"}), &json!("hello"))
        .unwrap();

    assert!(report.is_success());
    assert!(report.messages().is_empty());
}

#[test]
fn test_definition_referring_to_itself_loops() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "$ref": "#/definitions/x",
        "definitions": {"x": {"$ref": "#/definitions/x"}}
    });

    for instance in [json!(null), json!(1), json!({"a": [1, 2, 3]})] {
        let report = engine.validate(schema.clone(), &instance).unwrap();
        assert!(!report.is_success());
        assert!(report
            .messages()
            .iter()
            .any(|m| m.contains("loops on itself")));
    }
}

#[test]
fn test_unversioned_empty_schema_accepts_anything() {
    let engine = SchemaEngine::new();
    assert_eq!(
        engine.registry().resolve_version(Some(&json!({}))).unwrap(),
        SchemaVersion::DraftV3
    );
    assert!(engine.validate(json!({}), &json!(5)).unwrap().is_success());
}

#[test]
fn test_null_root_schema_is_a_hard_failure() {
    let engine = SchemaEngine::new();

    let err = engine.context(Value::Null).unwrap_err();
    assert!(matches!(err, EngineError::NullSchema));
    assert_eq!(err.to_string(), "schema is null");

    assert!(matches!(
        engine.validate(json!(true), &json!(1)),
        Err(EngineError::NotASchema)
    ));
}

#[test]
fn test_pointer_lookup_without_match() {
    let engine = SchemaEngine::new();
    let context = engine
        .context(json!({"properties": {"a": {"type": "string"}}}))
        .unwrap();

    let pointer = JsonPointer::parse("/properties/b").unwrap();
    let report = context.acquire_validator_at(&pointer, &json!("x")).validate();

    assert!(!report.is_success());
    assert_eq!(
        report.messages(),
        vec!["#: no match in schema for path #/properties/b"]
    );
}

#[test]
fn test_pointer_lookup_with_match() {
    let engine = SchemaEngine::new();
    let context = engine
        .context(json!({"properties": {"a": {"type": "string"}}}))
        .unwrap();

    let pointer = JsonPointer::parse("/properties/a").unwrap();
    assert!(context
        .acquire_validator_at(&pointer, &json!("x"))
        .validate()
        .is_success());
    assert!(!context
        .acquire_validator_at(&pointer, &json!(1))
        .validate()
        .is_success());
}

#[test]
fn test_sibling_branches_do_not_share_lineage() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "definitions": {"s": {"type": "string"}},
        "allOf": [
            {"$ref": "#/definitions/s"},
            {"$ref": "#/definitions/s"}
        ],
        "anyOf": [
            {"$ref": "#/definitions/s"},
            {"type": "null"}
        ]
    });

    assert!(engine.validate(schema.clone(), &json!("ok")).unwrap().is_success());

    let report = engine.validate(schema, &json!(1)).unwrap();
    assert!(report
        .messages()
        .iter()
        .all(|m| !m.contains("loops on itself")));
    assert_eq!(report.errors().len(), 3);
}

#[test]
fn test_same_definition_under_two_properties() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "definitions": {"s": {"type": "string"}},
        "properties": {
            "a": {"$ref": "#/definitions/s"},
            "b": {"$ref": "#/definitions/s"}
        }
    });

    assert!(engine
        .validate(schema.clone(), &json!({"a": "x", "b": "y"}))
        .unwrap()
        .is_success());

    let report = engine.validate(schema, &json!({"a": 1, "b": 2})).unwrap();
    let scopes: Vec<String> = report.errors().iter().map(|e| e.scope()).collect();
    assert_eq!(scopes, vec!["#/a", "#/b"]);
}

#[test]
fn test_identical_subschemas_are_not_a_loop() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "definitions": {
            "a": {"$ref": "#/definitions/b"},
            "b": {"$ref": "#/definitions/c"},
            "c": {"type": "integer"}
        },
        "$ref": "#/definitions/a"
    });
    assert!(engine.validate(schema, &json!(7)).unwrap().is_success());
}

#[test]
fn test_broken_branch_does_not_abort_siblings() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "properties": {
            "broken": {"type": 42},
            "dangling": {"$ref": "#/definitions/nowhere"},
            "fine": {"type": "integer"}
        }
    });

    let report = engine
        .validate(schema, &json!({"broken": 1, "dangling": 2, "fine": "x"}))
        .unwrap();
    let messages = report.messages();

    assert_eq!(messages.len(), 3);
    assert!(messages[0].starts_with("#/broken [schema]: keyword \"type\""));
    assert_eq!(
        messages[1],
        "#/dangling: no match in schema for path #/definitions/nowhere"
    );
    assert!(messages[2].starts_with("#/fine: instance does not match any allowed type"));
}
