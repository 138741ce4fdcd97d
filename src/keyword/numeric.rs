//! Numeric bounds and divisibility.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use super::failure;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

fn exclusive(schema: &Map<String, Value>, flag: &str) -> bool {
    schema.get(flag).and_then(Value::as_bool).unwrap_or(false)
}

/// Orders two JSON numbers, exactly when both are integers.
fn compare(value: &Number, bound: &Number) -> Option<Ordering> {
    if let (Some(v), Some(b)) = (value.as_i64(), bound.as_i64()) {
        return Some(v.cmp(&b));
    }
    if let (Some(v), Some(b)) = (value.as_u64(), bound.as_u64()) {
        return Some(v.cmp(&b));
    }
    // One side is above i64::MAX, the other is negative.
    if value.is_u64() && bound.is_i64() {
        return Some(Ordering::Greater);
    }
    if value.is_i64() && bound.is_u64() {
        return Some(Ordering::Less);
    }
    value.as_f64()?.partial_cmp(&bound.as_f64()?)
}

pub(crate) fn minimum(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Number(bound)), Value::Number(value)) = (schema.get("minimum"), instance) else {
        return;
    };
    let Some(ordering) = compare(value, bound) else {
        return;
    };

    if exclusive(schema, "exclusiveMinimum") {
        if ordering != Ordering::Greater {
            report.push(
                failure(ctx, "min_value", format!("must be greater than {}, got {}", bound, value))
                    .with_expected(format!("greater than {}", bound))
                    .with_got(value.to_string()),
            );
        }
    } else if ordering == Ordering::Less {
        report.push(
            failure(ctx, "min_value", format!("must be at least {}, got {}", bound, value))
                .with_expected(format!("at least {}", bound))
                .with_got(value.to_string()),
        );
    }
}

pub(crate) fn maximum(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Number(bound)), Value::Number(value)) = (schema.get("maximum"), instance) else {
        return;
    };
    let Some(ordering) = compare(value, bound) else {
        return;
    };

    if exclusive(schema, "exclusiveMaximum") {
        if ordering != Ordering::Less {
            report.push(
                failure(ctx, "max_value", format!("must be less than {}, got {}", bound, value))
                    .with_expected(format!("less than {}", bound))
                    .with_got(value.to_string()),
            );
        }
    } else if ordering == Ordering::Greater {
        report.push(
            failure(ctx, "max_value", format!("must be at most {}, got {}", bound, value))
                .with_expected(format!("at most {}", bound))
                .with_got(value.to_string()),
        );
    }
}

fn is_multiple(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        return d != 0 && v % d == 0;
    }
    match (value.as_f64(), divisor.as_f64()) {
        (Some(v), Some(d)) if d != 0.0 => {
            let quotient = v / d;
            (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
        }
        _ => false,
    }
}

fn check_multiple(
    keyword: &str,
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Number(divisor)), Value::Number(value)) = (schema.get(keyword), instance) else {
        return;
    };
    if !is_multiple(value, divisor) {
        report.push(
            failure(ctx, "multiple_of", format!("must be a multiple of {}, got {}", divisor, value))
                .with_expected(format!("multiple of {}", divisor))
                .with_got(value.to_string()),
        );
    }
}

pub(crate) fn divisible_by(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    check_multiple("divisibleBy", ctx, schema, instance, report);
}

pub(crate) fn multiple_of(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    check_multiple("multipleOf", ctx, schema, instance, report);
}
