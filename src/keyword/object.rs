//! Object members: declared, pattern-matched and additional properties,
//! required members, member counts and dependencies.

use serde_json::{Map, Value};

use super::{descend, failure};
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

fn missing(ctx: &ValidationContext, name: &str) -> crate::error::SchemaError {
    failure(ctx, "required", format!("required property \"{}\" is missing", name))
        .with_expected(name.to_string())
}

fn check_properties(
    draft_v3_required: bool,
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Object(properties)), Value::Object(members)) = (schema.get("properties"), instance)
    else {
        return;
    };
    let node = ctx.schema_node().child("properties");

    for (name, sub_schema) in properties {
        match members.get(name) {
            Some(member) => descend(
                &ctx.relocate(Some(name.as_str()), node.child(name.as_str())),
                member,
                report,
            ),
            None if draft_v3_required
                && sub_schema.get("required").and_then(Value::as_bool) == Some(true) =>
            {
                report.push(missing(ctx, name))
            }
            None => {}
        }
        if report.is_halted() {
            return;
        }
    }
}

/// Draft 3 `properties`, where a member schema may declare `"required": true`.
pub(crate) fn properties_v3(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    check_properties(true, ctx, schema, instance, report);
}

pub(crate) fn properties_v4(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    check_properties(false, ctx, schema, instance, report);
}

pub(crate) fn pattern_properties(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Object(patterns)), Value::Object(members)) =
        (schema.get("patternProperties"), instance)
    else {
        return;
    };
    let node = ctx.schema_node().child("patternProperties");

    for (name, member) in members {
        for pattern in patterns.keys() {
            let Ok(regex) = ctx.pattern(pattern) else {
                continue;
            };
            if regex.is_match(name) {
                descend(
                    &ctx.relocate(Some(name.as_str()), node.child(pattern.as_str())),
                    member,
                    report,
                );
                if report.is_halted() {
                    return;
                }
            }
        }
    }
}

fn is_declared(ctx: &ValidationContext, schema: &Map<String, Value>, name: &str) -> bool {
    let declared = schema
        .get("properties")
        .and_then(Value::as_object)
        .map_or(false, |properties| properties.contains_key(name));
    declared
        || schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .map_or(false, |patterns| {
                patterns
                    .keys()
                    .filter_map(|pattern| ctx.pattern(pattern).ok())
                    .any(|regex| regex.is_match(name))
            })
}

pub(crate) fn additional_properties(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(additional), Value::Object(members)) = (schema.get("additionalProperties"), instance)
    else {
        return;
    };

    for (name, member) in members {
        if is_declared(ctx, schema, name) {
            continue;
        }
        match additional {
            Value::Bool(false) => report.push(
                failure(
                    ctx,
                    "additional_property",
                    format!("additional property \"{}\" is not allowed", name),
                )
                .with_got(name.clone()),
            ),
            Value::Object(_) => descend(
                &ctx.relocate(Some(name.as_str()), ctx.schema_node().child("additionalProperties")),
                member,
                report,
            ),
            _ => return,
        }
        if report.is_halted() {
            return;
        }
    }
}

/// Draft 4 `required`: an array of member names.
pub(crate) fn required(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Array(names)), Value::Object(members)) = (schema.get("required"), instance) else {
        return;
    };
    for name in names.iter().filter_map(Value::as_str) {
        if !members.contains_key(name) {
            report.push(missing(ctx, name));
        }
    }
}

pub(crate) fn min_properties(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(min), Value::Object(members)) =
        (schema.get("minProperties").and_then(Value::as_u64), instance)
    else {
        return;
    };
    if (members.len() as u64) < min {
        report.push(
            failure(
                ctx,
                "min_properties",
                format!("object must have at least {} properties, got {}", min, members.len()),
            )
            .with_expected(format!("at least {} properties", min))
            .with_got(format!("{} properties", members.len())),
        );
    }
}

pub(crate) fn max_properties(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(max), Value::Object(members)) =
        (schema.get("maxProperties").and_then(Value::as_u64), instance)
    else {
        return;
    };
    if (members.len() as u64) > max {
        report.push(
            failure(
                ctx,
                "max_properties",
                format!("object must have at most {} properties, got {}", max, members.len()),
            )
            .with_expected(format!("at most {} properties", max))
            .with_got(format!("{} properties", members.len())),
        );
    }
}

/// `dependencies`: when a member is present, other members must be present
/// too (names) or the whole object must match a schema.
pub(crate) fn dependencies(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let (Some(Value::Object(dependencies)), Value::Object(members)) =
        (schema.get("dependencies"), instance)
    else {
        return;
    };
    let node = ctx.schema_node().child("dependencies");

    for (name, dependency) in dependencies {
        if !members.contains_key(name) {
            continue;
        }
        let required: Vec<&str> = match dependency {
            Value::String(other) => vec![other.as_str()],
            Value::Array(others) => others.iter().filter_map(Value::as_str).collect(),
            Value::Object(_) => {
                descend(&ctx.with_schema(node.child(name.as_str())), instance, report);
                Vec::new()
            }
            _ => Vec::new(),
        };
        for other in required {
            if !members.contains_key(other) {
                report.push(
                    failure(
                        ctx,
                        "dependency",
                        format!("property \"{}\" requires property \"{}\"", name, other),
                    )
                    .with_expected(other.to_string()),
                );
            }
        }
        if report.is_halted() {
            return;
        }
    }
}
