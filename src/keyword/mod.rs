//! Keyword rules for the bundled drafts.
//!
//! Every keyword has two sides: a syntax rule, which checks the keyword's
//! value inside one schema node, and an instance rule, which checks an
//! instance against it. Instance rules receive the whole schema object so
//! that a keyword can read its companions (`exclusiveMinimum` next to
//! `minimum`, `additionalItems` next to `items`, ...).

pub(crate) mod array;
pub(crate) mod combinators;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod reference;
pub(crate) mod string;
pub(crate) mod syntax;
pub(crate) mod types;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

/// Checks one keyword value inside a schema node.
pub(crate) type SyntaxRule = fn(&Value) -> Result<(), String>;

/// Checks an instance against one keyword of the schema in scope.
pub(crate) type KeywordRule = fn(&ValidationContext, &Map<String, Value>, &Value, &mut ValidationReport);

/// Returns the JSON Schema type name of a value. Numbers without a fraction
/// part in their representation are `integer`.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON equality where numbers compare by value (`1` equals `1.0`).
pub(crate) fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

/// A failure at the context's instance position.
pub(crate) fn failure(ctx: &ValidationContext, code: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::new(ctx.path().clone(), message).with_code(code)
}

/// Validates `instance` in a child context and merges the outcome.
pub(crate) fn descend(child: &ValidationContext, instance: &Value, report: &mut ValidationReport) {
    report.merge(child.acquire_validator(instance).validate());
}

/// Validates `instance` in a child context, only telling whether it passed.
pub(crate) fn matches(child: &ValidationContext, instance: &Value) -> bool {
    child.acquire_validator(instance).validate().is_success()
}

/// Validates `instance` against a draft 3 (or `$schema`-selected) schema.
#[cfg(test)]
pub(crate) fn run(schema: Value, instance: Value) -> ValidationReport {
    use std::sync::Arc;

    use crate::location::SchemaLocation;
    use crate::registry::VersionRegistry;
    use crate::report::ReportFactory;
    use crate::resolver::DocumentStore;
    use crate::validation::DEFAULT_MAX_DEPTH;

    let location = SchemaLocation::new(Arc::new(schema), Arc::new(DocumentStore::default()));
    let ctx = ValidationContext::new(
        location,
        Arc::new(VersionRegistry::new()),
        ReportFactory::default(),
        DEFAULT_MAX_DEPTH,
    )
    .expect("root schema is an object");
    let report = ctx.acquire_validator(&instance).validate();
    report
}
