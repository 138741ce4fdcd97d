//! `type`, `disallow` and `enum`.

use serde_json::{Map, Value};

use super::{failure, json_equal, json_type, matches};
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

fn type_matches(name: &str, instance: &Value) -> bool {
    let actual = json_type(instance);
    name == "any" || name == actual || (name == "number" && actual == "integer")
}

/// True when `instance` matches one member of a `type`-like union. Schema
/// members (draft 3 only) are tried in a child context at the same instance
/// position.
fn union_matches(ctx: &ValidationContext, keyword: &str, union: &Value, instance: &Value) -> bool {
    match union {
        Value::String(name) => type_matches(name, instance),
        Value::Array(members) => members.iter().enumerate().any(|(i, member)| match member {
            Value::String(name) => type_matches(name, instance),
            Value::Object(_) => {
                let node = ctx.schema_node().child(keyword).index(i);
                matches(&ctx.with_schema(node), instance)
            }
            _ => false,
        }),
        _ => true,
    }
}

fn describe(union: &Value) -> String {
    match union {
        Value::Array(members) => members
            .iter()
            .map(|member| match member {
                Value::String(name) => name.clone(),
                _ => "schema".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn type_(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Some(union) = schema.get("type") else {
        return;
    };
    if !union_matches(ctx, "type", union, instance) {
        report.push(
            failure(ctx, "invalid_type", "instance does not match any allowed type")
                .with_expected(describe(union))
                .with_got(json_type(instance)),
        );
    }
}

pub(crate) fn disallow(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Some(union) = schema.get("disallow") else {
        return;
    };
    if union_matches(ctx, "disallow", union, instance) {
        report.push(
            failure(ctx, "disallowed", "instance matches a disallowed type")
                .with_got(json_type(instance)),
        );
    }
}

pub(crate) fn enum_(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Some(Value::Array(values)) = schema.get("enum") else {
        return;
    };
    if !values.iter().any(|value| json_equal(value, instance)) {
        report.push(
            failure(ctx, "enum", "value is not one of the enumerated values")
                .with_expected(Value::Array(values.clone()).to_string())
                .with_got(instance.to_string()),
        );
    }
}
