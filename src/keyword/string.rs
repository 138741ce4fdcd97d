//! String length and pattern.
//!
//! Lengths count Unicode scalar values, not bytes. Patterns are searched
//! anywhere in the string; schemas anchor them explicitly when they need to.

use serde_json::{Map, Value};

use super::failure;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

pub(crate) fn min_length(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(min), Value::String(s)) = (schema.get("minLength").and_then(Value::as_u64), instance)
    else {
        return;
    };
    let len = s.chars().count() as u64;
    if len < min {
        report.push(
            failure(ctx, "min_length", format!("length must be at least {}, got {}", min, len))
                .with_expected(format!("at least {} characters", min))
                .with_got(format!("{} characters", len)),
        );
    }
}

pub(crate) fn max_length(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(max), Value::String(s)) = (schema.get("maxLength").and_then(Value::as_u64), instance)
    else {
        return;
    };
    let len = s.chars().count() as u64;
    if len > max {
        report.push(
            failure(ctx, "max_length", format!("length must be at most {}, got {}", max, len))
                .with_expected(format!("at most {} characters", max))
                .with_got(format!("{} characters", len)),
        );
    }
}

pub(crate) fn pattern(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(pattern), Value::String(s)) = (schema.get("pattern").and_then(Value::as_str), instance)
    else {
        return;
    };
    match ctx.pattern(pattern) {
        Ok(regex) if regex.is_match(s) => {}
        Ok(_) => report.push(
            failure(ctx, "pattern", format!("must match pattern '{}'", pattern))
                .with_expected(format!("string matching '{}'", pattern))
                .with_got(s.clone()),
        ),
        Err(e) => report.error_with_code("invalid_pattern", format!("invalid regex '{}': {}", pattern, e)),
    }
}
