//! `$ref`.
//!
//! A reference is resolved in two steps: the URI part redirects the root
//! document (a bare `#...` keeps the current one), then the fragment is
//! looked up as a JSON Pointer from that root. Loop detection happens in the
//! lookup step.

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::pointer::JsonPointer;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

/// Resolves a non-fragment reference against the base URI of the document
/// it appears in, when there is one.
fn absolutize(base: Option<&Url>, target: &str) -> String {
    if target.is_empty() || target.starts_with('#') {
        return target.to_string();
    }
    match base.map(|base| base.join(target)) {
        Some(Ok(url)) => url.into(),
        _ => target.to_string(),
    }
}

pub(crate) fn reference(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Some(target) = schema.get("$ref").and_then(Value::as_str) else {
        return;
    };
    let uri = absolutize(ctx.base_uri(), target);

    let next = match ctx.follow_uri(&uri) {
        Ok(next) => next,
        Err(e) => {
            debug!(reference = %target, error = %e, "unresolvable $ref");
            report.error_with_code(
                "ref_unresolvable",
                format!("cannot resolve reference \"{}\": {}", target, e),
            );
            return;
        }
    };

    let fragment = uri.split_once('#').map_or("", |(_, fragment)| fragment);
    match JsonPointer::parse(fragment) {
        Ok(pointer) => report.merge(next.acquire_validator_at(&pointer, instance).validate()),
        Err(e) => report.error_with_code(
            "ref_invalid_pointer",
            format!("reference \"{}\" is not a JSON Pointer: {}", target, e),
        ),
    }
}
