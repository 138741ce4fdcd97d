//! Format validators for the `format` keyword.
//!
//! Each draft has its own table of named checks. Only strings are checked;
//! any other instance type passes, as does a format no table knows about.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use crate::error::SchemaError;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;
use crate::validator::Validator;

/// One named string check.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormatRule {
    check: fn(&str) -> bool,
    message: &'static str,
}

impl FormatRule {
    const fn new(check: fn(&str) -> bool, message: &'static str) -> Self {
        Self { check, message }
    }
}

pub(crate) type FormatTable = IndexMap<&'static str, FormatRule>;

const IPV4: FormatRule = FormatRule::new(is_ipv4, "string is not a valid IPv4 address");
const IPV6: FormatRule = FormatRule::new(is_ipv6, "string is not a valid IPv6 address");
const URI: FormatRule = FormatRule::new(is_uri, "string is not a valid URI");
const REGEX: FormatRule = FormatRule::new(is_regex, "string is not a valid regular expression");
const EMAIL: FormatRule = FormatRule::new(is_email, "string is not a valid email address");
const HOST_NAME: FormatRule = FormatRule::new(is_host_name, "string is not a valid host name");

pub(crate) fn draft_v3() -> FormatTable {
    IndexMap::from([
        ("ip-address", IPV4),
        ("ipv6", IPV6),
        ("uri", URI),
        ("regex", REGEX),
        ("email", EMAIL),
        ("host-name", HOST_NAME),
    ])
}

pub(crate) fn draft_v4() -> FormatTable {
    IndexMap::from([
        ("ipv4", IPV4),
        ("ipv6", IPV6),
        ("uri", URI),
        ("regex", REGEX),
        ("email", EMAIL),
        ("hostname", HOST_NAME),
    ])
}

fn shape(cell: &'static OnceLock<Option<Regex>>, pattern: &str, s: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .map_or(false, |regex| regex.is_match(s))
}

/// Dotted-quad shape first, so that forms the address parser would reject
/// for other reasons still get the same message.
fn is_ipv4(s: &str) -> bool {
    static DOTTED_QUAD: OnceLock<Option<Regex>> = OnceLock::new();
    shape(&DOTTED_QUAD, r"^\d+\.\d+\.\d+\.\d+$", s) && s.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(s: &str) -> bool {
    s.contains(':') && s.parse::<Ipv6Addr>().is_ok()
}

fn is_uri(s: &str) -> bool {
    Url::parse(s).is_ok()
}

fn is_regex(s: &str) -> bool {
    Regex::new(s).is_ok()
}

fn is_email(s: &str) -> bool {
    static EMAIL_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    shape(&EMAIL_SHAPE, r"^[^@\s]+@[^@\s]+$", s)
}

fn is_host_name(s: &str) -> bool {
    static LABELS: OnceLock<Option<Regex>> = OnceLock::new();
    s.len() <= 255
        && shape(
            &LABELS,
            r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
            s,
        )
}

/// Checks one instance against one named format.
pub(crate) struct FormatValidator<'i> {
    report: ValidationReport,
    format: String,
    rule: FormatRule,
    instance: &'i Value,
}

impl<'i> FormatValidator<'i> {
    pub(crate) fn new(
        report: ValidationReport,
        format: &str,
        rule: FormatRule,
        instance: &'i Value,
    ) -> Self {
        Self {
            report,
            format: format.to_string(),
            rule,
            instance,
        }
    }
}

impl Validator for FormatValidator<'_> {
    fn validate(&self) -> ValidationReport {
        let mut report = self.report.clone();
        if let Value::String(s) = self.instance {
            if !(self.rule.check)(s) {
                let error = SchemaError::new(report.path().clone(), self.rule.message)
                    .with_code("format")
                    .with_expected(self.format.clone())
                    .with_got(s.clone());
                report.push(error);
            }
        }
        report
    }
}

/// The `format` keyword: delegates to the bundle's format validator.
pub(crate) fn keyword(
    ctx: &ValidationContext,
    schema: &Map<String, Value>,
    instance: &Value,
    report: &mut ValidationReport,
) {
    let Some(name) = schema.get("format").and_then(Value::as_str) else {
        return;
    };
    report.merge(ctx.acquire_format_validator(name, instance).validate());
}
