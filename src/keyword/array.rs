//! Array size, uniqueness and item schemas.

use serde_json::{Map, Value};

use super::{descend, failure, json_equal};
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

pub(crate) fn min_items(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(min), Value::Array(items)) = (schema.get("minItems").and_then(Value::as_u64), instance)
    else {
        return;
    };
    if (items.len() as u64) < min {
        report.push(
            failure(
                ctx,
                "min_items",
                format!("array must have at least {} items, got {}", min, items.len()),
            )
            .with_expected(format!("at least {} items", min))
            .with_got(format!("{} items", items.len())),
        );
    }
}

pub(crate) fn max_items(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(max), Value::Array(items)) = (schema.get("maxItems").and_then(Value::as_u64), instance)
    else {
        return;
    };
    if (items.len() as u64) > max {
        report.push(
            failure(
                ctx,
                "max_items",
                format!("array must have at most {} items, got {}", max, items.len()),
            )
            .with_expected(format!("at most {} items", max))
            .with_got(format!("{} items", items.len())),
        );
    }
}

pub(crate) fn unique_items(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(true), Value::Array(items)) = (schema.get("uniqueItems").and_then(Value::as_bool), instance)
    else {
        return;
    };
    for (i, item) in items.iter().enumerate() {
        let duplicates: Vec<usize> = (i + 1..items.len())
            .filter(|&j| json_equal(item, &items[j]))
            .collect();
        if let Some(&first) = duplicates.first() {
            let indices = vec![i, first];
            report.push(
                failure(ctx, "unique", format!("duplicate value at indices {:?}", indices))
                    .with_got(format!("duplicates at indices {:?}", indices)),
            );
            return;
        }
    }
}

/// `items`, together with `additionalItems` for tuple-style arrays.
pub(crate) fn items(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Value::Array(elements) = instance else {
        return;
    };
    let node = ctx.schema_node().child("items");

    match schema.get("items") {
        Some(Value::Object(_)) => {
            for (i, element) in elements.iter().enumerate() {
                let index = i.to_string();
                descend(&ctx.relocate(Some(index.as_str()), node.clone()), element, report);
                if report.is_halted() {
                    return;
                }
            }
        }
        Some(Value::Array(tuple)) => {
            for (i, element) in elements.iter().enumerate() {
                let index = i.to_string();
                let child = if i < tuple.len() {
                    node.index(i)
                } else {
                    match schema.get("additionalItems") {
                        Some(Value::Bool(false)) => {
                            report.push(
                                failure(
                                    ctx,
                                    "additional_items",
                                    format!(
                                        "array must have at most {} items, got {}",
                                        tuple.len(),
                                        elements.len()
                                    ),
                                )
                                .with_expected(format!("at most {} items", tuple.len()))
                                .with_got(format!("{} items", elements.len())),
                            );
                            return;
                        }
                        Some(Value::Object(_)) => ctx.schema_node().child("additionalItems"),
                        _ => return,
                    }
                };
                descend(&ctx.relocate(Some(index.as_str()), child), element, report);
                if report.is_halted() {
                    return;
                }
            }
        }
        _ => {}
    }
}
