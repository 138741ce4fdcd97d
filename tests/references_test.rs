//! Tests for `$ref` resolution: recursion, loops, and references across
//! documents.

use std::thread;

use serde_json::{json, Value};
use url::Url;
use waymark::{ResolveError, SchemaEngine};

fn linked_list(depth: usize, last_value: Value) -> Value {
    let mut node = json!({"value": last_value});
    for i in 0..depth {
        node = json!({"value": i, "next": node});
    }
    node
}

fn memory_engine() -> SchemaEngine {
    SchemaEngine::builder()
        .with_resolver(|uri: &Url| -> Result<Value, ResolveError> {
            match uri.as_str() {
                "mem://schemas/root.json" => Ok(json!({
                    "properties": {
                        "id": {"$ref": "types.json#/definitions/id"},
                        "tags": {"items": {"$ref": "types.json#/definitions/tag"}}
                    }
                })),
                "mem://schemas/types.json" => Ok(json!({
                    "definitions": {
                        "id": {"type": "integer", "minimum": 1},
                        "tag": {"$ref": "#/definitions/word"},
                        "word": {"type": "string", "pattern": "^[a-z]+$"}
                    }
                })),
                "mem://loop/a" => Ok(json!({"definitions": {"x": {"$ref": "mem://loop/b#/definitions/y"}}})),
                "mem://loop/b" => Ok(json!({"definitions": {"y": {"$ref": "mem://loop/a#/definitions/x"}}})),
                _ => Err(ResolveError::NotFound(uri.to_string())),
            }
        })
        .build()
}

#[test]
fn test_recursive_schema_on_nested_instance() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "properties": {
            "value": {"type": "integer"},
            "next": {"$ref": "#"}
        }
    });

    assert!(engine
        .validate(schema.clone(), &linked_list(5, json!(99)))
        .unwrap()
        .is_success());

    let report = engine
        .validate(schema, &linked_list(2, json!("not a number")))
        .unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].scope(), "#/next/next/value");
}

#[test]
fn test_mutual_recursion_through_definitions() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "definitions": {
            "tree": {
                "properties": {
                    "name": {"type": "string"},
                    "children": {"items": {"$ref": "#/definitions/tree"}}
                }
            }
        },
        "$ref": "#/definitions/tree"
    });

    let tree = json!({
        "name": "root",
        "children": [
            {"name": "a", "children": []},
            {"name": "b", "children": [{"name": 3}]}
        ]
    });

    let report = engine.validate(schema, &tree).unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].scope(), "#/children/1/children/0/name");
}

#[test]
fn test_two_step_loop() {
    let engine = SchemaEngine::new();
    let schema = json!({
        "definitions": {
            "a": {"$ref": "#/definitions/b"},
            "b": {"$ref": "#/definitions/a"}
        },
        "$ref": "#/definitions/a"
    });

    let report = engine.validate(schema, &json!("anything")).unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].code, "ref_loop");
}

#[test]
fn test_loop_terminates_for_large_instances() {
    let engine = SchemaEngine::new();
    let schema = json!({"items": {"$ref": "#/definitions/x"}, "definitions": {"x": {"$ref": "#/definitions/x"}}});
    let instance = Value::Array((0..500).map(|i| json!(i)).collect());

    let report = engine.validate(schema, &instance).unwrap();
    assert_eq!(report.errors().len(), 500);
    assert!(report.errors().iter().all(|e| e.code == "ref_loop"));
}

#[test]
fn test_depth_limit_bounds_deep_instances() {
    let engine = SchemaEngine::builder().with_max_depth(10).build();
    let schema = json!({"properties": {"next": {"$ref": "#"}}});

    let report = engine.validate(schema.clone(), &linked_list(20, json!(0))).unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].code, "max_depth_exceeded");

    assert!(engine.validate(schema, &linked_list(3, json!(0))).unwrap().is_success());
}

#[test]
fn test_default_engine_accepts_deep_recursive_instances() {
    // Same stack size as the main thread; test threads default to 2 MiB.
    let handle = thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| {
            let engine = SchemaEngine::new();
            let schema = json!({
                "properties": {
                    "value": {"type": "integer"},
                    "next": {"$ref": "#"}
                }
            });

            for depth in [40, 50, 60, 100] {
                let report = engine
                    .validate(schema.clone(), &linked_list(depth, json!(0)))
                    .unwrap();
                assert!(report.is_success(), "depth {}: {}", depth, report);
            }

            let report = engine
                .validate(schema, &linked_list(100, json!("last")))
                .unwrap();
            assert_eq!(report.errors().len(), 1);
            assert_eq!(report.errors()[0].code, "invalid_type");
            assert_eq!(
                report.errors()[0].scope(),
                format!("#{}/value", "/next".repeat(100))
            );
        })
        .unwrap();
    handle.join().unwrap();
}

#[test]
fn test_relative_references_resolve_against_document_uri() {
    let engine = memory_engine();

    assert!(engine
        .validate_uri("mem://schemas/root.json", &json!({"id": 4, "tags": ["a", "bc"]}))
        .unwrap()
        .is_success());

    let report = engine
        .validate_uri("mem://schemas/root.json", &json!({"id": 0, "tags": ["ok", "NO"]}))
        .unwrap();
    let scopes: Vec<String> = report.errors().iter().map(|e| e.scope()).collect();
    assert_eq!(scopes, vec!["#/id", "#/tags/1"]);
    assert_eq!(engine.documents().len(), 2);
}

#[test]
fn test_loop_across_documents() {
    let engine = memory_engine();
    let report = engine
        .validate(json!({"$ref": "mem://loop/a#/definitions/x"}), &json!(1))
        .unwrap();

    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].code, "ref_loop");
}

#[test]
fn test_unresolvable_document_is_reported() {
    let engine = memory_engine();
    let schema = json!({
        "properties": {
            "a": {"$ref": "mem://nowhere#/x"},
            "b": {"type": "string"}
        }
    });

    let report = engine.validate(schema, &json!({"a": 1, "b": 2})).unwrap();
    assert_eq!(report.errors().len(), 2);
    assert_eq!(report.errors()[0].code, "ref_unresolvable");
    assert!(report.errors()[0].message.contains("document not found"));
    assert_eq!(report.errors()[1].scope(), "#/b");
}
