//! Schema combinators: `allOf`, `anyOf`, `oneOf`, `not` and draft 3 `extends`.
//!
//! Every branch is validated in a child context at the same instance
//! position, so a `$ref` chain inside one branch never leaks into another.

use serde_json::{Map, Value};

use super::{descend, failure, matches};
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

fn branches<'a>(
    ctx: &'a ValidationContext,
    schema: &'a Map<String, Value>,
    keyword: &'a str,
) -> impl Iterator<Item = ValidationContext> + 'a {
    let count = schema.get(keyword).and_then(Value::as_array).map_or(0, Vec::len);
    let node = ctx.schema_node().child(keyword);
    (0..count).map(move |i| ctx.with_schema(node.index(i)))
}

pub(crate) fn all_of(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    for branch in branches(ctx, schema, "allOf") {
        descend(&branch, instance, report);
        if report.is_halted() {
            return;
        }
    }
}

pub(crate) fn any_of(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let mut count = 0;
    for branch in branches(ctx, schema, "anyOf") {
        if matches(&branch, instance) {
            return;
        }
        count += 1;
    }
    if count > 0 {
        report.push(failure(
            ctx,
            "any_of_none_matched",
            format!("value did not match any of {} schemas", count),
        ));
    }
}

pub(crate) fn one_of(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let results: Vec<bool> = branches(ctx, schema, "oneOf")
        .map(|branch| matches(&branch, instance))
        .collect();
    if results.is_empty() {
        return;
    }
    let matched: Vec<usize> = results
        .iter()
        .enumerate()
        .filter_map(|(i, ok)| ok.then_some(i))
        .collect();

    match matched.len() {
        1 => {}
        0 => report.push(failure(
            ctx,
            "one_of_none_matched",
            format!("value did not match any of {} schemas", results.len()),
        )),
        n => report.push(failure(
            ctx,
            "one_of_multiple_matched",
            format!(
                "value matched {} schemas (indices {:?}), expected exactly one",
                n, matched
            ),
        )),
    }
}

pub(crate) fn not(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    if !schema.contains_key("not") {
        return;
    }
    let branch = ctx.with_schema(ctx.schema_node().child("not"));
    if matches(&branch, instance) {
        report.push(failure(ctx, "not_matched", "value must not match the schema in \"not\""));
    }
}

/// Draft 3 `extends`: one schema or an array of schemas, all of which apply.
pub(crate) fn extends(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let node = ctx.schema_node().child("extends");
    match schema.get("extends") {
        Some(Value::Object(_)) => descend(&ctx.with_schema(node), instance, report),
        Some(Value::Array(parents)) => {
            for i in 0..parents.len() {
                descend(&ctx.with_schema(node.index(i)), instance, report);
                if report.is_halted() {
                    return;
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::keyword::run;
    use serde_json::json;

    const V4: &str = "http://json-schema.org/draft-04/schema#";

    #[test]
    fn test_all_of_accumulates() {
        let schema = json!({"$schema": V4, "allOf": [{"minimum": 5}, {"maximum": 3}]});
        assert_eq!(run(schema, json!(4)).errors().len(), 2);
    }

    #[test]
    fn test_any_of() {
        let schema = json!({"$schema": V4, "anyOf": [{"type": "string"}, {"minimum": 10}]});
        assert!(run(schema.clone(), json!("x")).is_success());
        assert!(run(schema.clone(), json!(11)).is_success());
        let report = run(schema, json!(2));
        assert_eq!(report.errors()[0].code, "any_of_none_matched");
        assert_eq!(report.errors()[0].message, "value did not match any of 2 schemas");
    }

    #[test]
    fn test_one_of() {
        let schema = json!({"$schema": V4, "oneOf": [{"type": "integer"}, {"minimum": 2}]});
        assert!(run(schema.clone(), json!(1)).is_success());
        assert!(run(schema.clone(), json!(2.5)).is_success());
        assert_eq!(
            run(schema.clone(), json!(3)).errors()[0].message,
            "value matched 2 schemas (indices [0, 1]), expected exactly one"
        );
        assert_eq!(run(schema, json!(1.5)).errors()[0].code, "one_of_none_matched");
    }

    #[test]
    fn test_not() {
        let schema = json!({"$schema": V4, "not": {"type": "null"}});
        assert!(run(schema.clone(), json!(1)).is_success());
        assert_eq!(run(schema, json!(null)).errors()[0].code, "not_matched");
    }

    #[test]
    fn test_extends() {
        let schema = json!({"extends": [{"type": "string"}, {"maxLength": 2}], "minLength": 1});
        assert!(run(schema.clone(), json!("ab")).is_success());
        assert_eq!(run(schema.clone(), json!("abc")).errors().len(), 1);
        assert!(!run(json!({"extends": {"type": "integer"}}), json!("a")).is_success());
    }
}
