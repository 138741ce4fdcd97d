//! Syntax rules shared by several keywords.
//!
//! Each rule checks the value of one keyword in isolation and describes the
//! problem on failure; the bundle prefixes the keyword name.

use std::collections::HashSet;

use regex::Regex;
use serde_json::Value;

use super::json_type;

const SIMPLE_TYPES: [&str; 7] = [
    "array", "boolean", "integer", "null", "number", "object", "string",
];

fn expected(what: &str, value: &Value) -> String {
    format!("expected {}, found {}", what, json_type(value))
}

pub(crate) fn string(value: &Value) -> Result<(), String> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(expected("a string", other)),
    }
}

pub(crate) fn boolean(value: &Value) -> Result<(), String> {
    match value {
        Value::Bool(_) => Ok(()),
        other => Err(expected("a boolean", other)),
    }
}

pub(crate) fn number(value: &Value) -> Result<(), String> {
    match value {
        Value::Number(_) => Ok(()),
        other => Err(expected("a number", other)),
    }
}

pub(crate) fn positive_number(value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(n) if n > 0.0 => Ok(()),
        Some(n) => Err(format!("expected a strictly positive number, found {}", n)),
        None => Err(expected("a number", value)),
    }
}

pub(crate) fn non_negative_integer(value: &Value) -> Result<(), String> {
    match value.as_u64() {
        Some(_) => Ok(()),
        None => Err(expected("a non-negative integer", value)),
    }
}

pub(crate) fn schema(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(_) => Ok(()),
        other => Err(expected("a schema (object)", other)),
    }
}

pub(crate) fn schema_or_boolean(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(_) | Value::Bool(_) => Ok(()),
        other => Err(expected("a schema or a boolean", other)),
    }
}

pub(crate) fn schema_or_schema_array(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(_) => Ok(()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| schema(item).map_err(|e| format!("element {}: {}", i, e))),
        other => Err(expected("a schema or an array of schemas", other)),
    }
}

pub(crate) fn schema_array(value: &Value) -> Result<(), String> {
    match value {
        Value::Array(items) if items.is_empty() => Err("array must not be empty".to_string()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| schema(item).map_err(|e| format!("element {}: {}", i, e))),
        other => Err(expected("an array of schemas", other)),
    }
}

pub(crate) fn schema_map(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(members) => members.iter().try_for_each(|(name, member)| {
            schema(member).map_err(|e| format!("member \"{}\": {}", name, e))
        }),
        other => Err(expected("an object of schemas", other)),
    }
}

pub(crate) fn pattern(value: &Value) -> Result<(), String> {
    match value {
        Value::String(p) => Regex::new(p)
            .map(|_| ())
            .map_err(|e| format!("invalid regex \"{}\": {}", p, e)),
        other => Err(expected("a regex string", other)),
    }
}

pub(crate) fn pattern_schema_map(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(members) => members.iter().try_for_each(|(p, member)| {
            Regex::new(p).map_err(|e| format!("invalid regex \"{}\": {}", p, e))?;
            schema(member).map_err(|e| format!("member \"{}\": {}", p, e))
        }),
        other => Err(expected("an object of schemas", other)),
    }
}

pub(crate) fn non_empty_array(value: &Value) -> Result<(), String> {
    match value {
        Value::Array(items) if items.is_empty() => Err("array must not be empty".to_string()),
        Value::Array(_) => Ok(()),
        other => Err(expected("an array", other)),
    }
}

pub(crate) fn unique_string_array(value: &Value) -> Result<(), String> {
    let items = match value {
        Value::Array(items) if items.is_empty() => {
            return Err("array must not be empty".to_string())
        }
        Value::Array(items) => items,
        other => return Err(expected("an array of strings", other)),
    };
    let mut seen = HashSet::new();
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| expected("an array of strings", item))?;
        if !seen.insert(name) {
            return Err(format!("duplicate element \"{}\"", name));
        }
    }
    Ok(())
}

fn type_name(name: &str, allow_any: bool) -> Result<(), String> {
    if SIMPLE_TYPES.contains(&name) || (allow_any && name == "any") {
        Ok(())
    } else {
        Err(format!("unknown type \"{}\"", name))
    }
}

/// Draft 3 `type` and `disallow`: a type name, or an array of type names and
/// schemas.
pub(crate) fn union_type(value: &Value) -> Result<(), String> {
    match value {
        Value::String(name) => type_name(name, true),
        Value::Array(items) => items.iter().try_for_each(|item| match item {
            Value::String(name) => type_name(name, true),
            Value::Object(_) => Ok(()),
            other => Err(expected("a type name or a schema", other)),
        }),
        other => Err(expected("a string or an array", other)),
    }
}

/// Draft 4 `type`: a type name, or a non-empty array of unique type names.
pub(crate) fn simple_type(value: &Value) -> Result<(), String> {
    match value {
        Value::String(name) => type_name(name, false),
        Value::Array(_) => {
            unique_string_array(value)?;
            value
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .try_for_each(|name| type_name(name, false))
        }
        other => Err(expected("a string or an array", other)),
    }
}

/// Draft 3 `dependencies`: each member is a property name, an array of
/// property names, or a schema.
pub(crate) fn dependencies_v3(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(members) => members.iter().try_for_each(|(name, member)| match member {
            Value::String(_) | Value::Object(_) => Ok(()),
            Value::Array(items) if items.iter().all(Value::is_string) => Ok(()),
            other => Err(format!(
                "member \"{}\": {}",
                name,
                expected("a string, an array of strings or a schema", other)
            )),
        }),
        other => Err(expected("an object", other)),
    }
}

/// Draft 4 `dependencies`: each member is a non-empty array of unique
/// property names, or a schema.
pub(crate) fn dependencies_v4(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(members) => members.iter().try_for_each(|(name, member)| match member {
            Value::Object(_) => Ok(()),
            Value::Array(_) => {
                unique_string_array(member).map_err(|e| format!("member \"{}\": {}", name, e))
            }
            other => Err(format!(
                "member \"{}\": {}",
                name,
                expected("an array of strings or a schema", other)
            )),
        }),
        other => Err(expected("an object", other)),
    }
}
