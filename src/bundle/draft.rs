//! The bundled draft 3 and draft 4 rule sets.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::{RuleBundle, SyntaxCache};
use crate::error::EngineError;
use crate::format::{self, FormatTable, FormatValidator};
use crate::keyword::{
    array, combinators, numeric, object, reference, string, syntax, types, KeywordRule, SyntaxRule,
};
use crate::location::SchemaNode;
use crate::report::ValidationReport;
use crate::validation::{ValidationContext, SCHEMA_REPORT_SUFFIX};
use crate::validator::{AlwaysFalseValidator, AlwaysTrueValidator, KeywordValidator, Validator};
use crate::version::SchemaVersion;

/// Syntax, instance and format rules of one JSON Schema draft.
///
/// Instance rules run in table order, and only for keywords present in the
/// schema. A schema holding `$ref` is validated through the reference alone.
///
/// # Example
///
/// ```rust
/// use waymark::{DraftBundle, SchemaVersion};
///
/// let bundle = DraftBundle::draft_v4();
/// assert_eq!(bundle.version(), SchemaVersion::DraftV4);
/// assert!(bundle.keywords().any(|k| k == "oneOf"));
/// assert!(!bundle.keywords().any(|k| k == "extends"));
/// ```
pub struct DraftBundle {
    version: SchemaVersion,
    syntax: IndexMap<&'static str, SyntaxRule>,
    keywords: IndexMap<&'static str, KeywordRule>,
    formats: FormatTable,
    validated: SyntaxCache,
}

impl DraftBundle {
    /// Draft 3 rules.
    pub fn draft_v3() -> Self {
        let syntax: IndexMap<&'static str, SyntaxRule> = IndexMap::from([
            ("$schema", syntax::string as SyntaxRule),
            ("$ref", syntax::string),
            ("id", syntax::string),
            ("title", syntax::string),
            ("description", syntax::string),
            ("type", syntax::union_type),
            ("disallow", syntax::union_type),
            ("enum", syntax::non_empty_array),
            ("minimum", syntax::number),
            ("maximum", syntax::number),
            ("exclusiveMinimum", syntax::boolean),
            ("exclusiveMaximum", syntax::boolean),
            ("divisibleBy", syntax::positive_number),
            ("minLength", syntax::non_negative_integer),
            ("maxLength", syntax::non_negative_integer),
            ("pattern", syntax::pattern),
            ("format", syntax::string),
            ("minItems", syntax::non_negative_integer),
            ("maxItems", syntax::non_negative_integer),
            ("uniqueItems", syntax::boolean),
            ("items", syntax::schema_or_schema_array),
            ("additionalItems", syntax::schema_or_boolean),
            ("required", syntax::boolean),
            ("properties", syntax::schema_map),
            ("patternProperties", syntax::pattern_schema_map),
            ("additionalProperties", syntax::schema_or_boolean),
            ("dependencies", syntax::dependencies_v3),
            ("extends", syntax::schema_or_schema_array),
            ("definitions", syntax::schema_map),
        ]);

        let keywords: IndexMap<&'static str, KeywordRule> = IndexMap::from([
            ("type", types::type_ as KeywordRule),
            ("disallow", types::disallow),
            ("enum", types::enum_),
            ("minimum", numeric::minimum),
            ("maximum", numeric::maximum),
            ("divisibleBy", numeric::divisible_by),
            ("minLength", string::min_length),
            ("maxLength", string::max_length),
            ("pattern", string::pattern),
            ("format", format::keyword),
            ("minItems", array::min_items),
            ("maxItems", array::max_items),
            ("uniqueItems", array::unique_items),
            ("items", array::items),
            ("properties", object::properties_v3),
            ("patternProperties", object::pattern_properties),
            ("additionalProperties", object::additional_properties),
            ("dependencies", object::dependencies),
            ("extends", combinators::extends),
        ]);

        Self {
            version: SchemaVersion::DraftV3,
            syntax,
            keywords,
            formats: format::draft_v3(),
            validated: SyntaxCache::new(),
        }
    }

    /// Draft 4 rules.
    pub fn draft_v4() -> Self {
        let syntax: IndexMap<&'static str, SyntaxRule> = IndexMap::from([
            ("$schema", syntax::string as SyntaxRule),
            ("$ref", syntax::string),
            ("id", syntax::string),
            ("title", syntax::string),
            ("description", syntax::string),
            ("type", syntax::simple_type),
            ("enum", syntax::non_empty_array),
            ("minimum", syntax::number),
            ("maximum", syntax::number),
            ("exclusiveMinimum", syntax::boolean),
            ("exclusiveMaximum", syntax::boolean),
            ("multipleOf", syntax::positive_number),
            ("minLength", syntax::non_negative_integer),
            ("maxLength", syntax::non_negative_integer),
            ("pattern", syntax::pattern),
            ("format", syntax::string),
            ("minItems", syntax::non_negative_integer),
            ("maxItems", syntax::non_negative_integer),
            ("uniqueItems", syntax::boolean),
            ("items", syntax::schema_or_schema_array),
            ("additionalItems", syntax::schema_or_boolean),
            ("required", syntax::unique_string_array),
            ("minProperties", syntax::non_negative_integer),
            ("maxProperties", syntax::non_negative_integer),
            ("properties", syntax::schema_map),
            ("patternProperties", syntax::pattern_schema_map),
            ("additionalProperties", syntax::schema_or_boolean),
            ("dependencies", syntax::dependencies_v4),
            ("allOf", syntax::schema_array),
            ("anyOf", syntax::schema_array),
            ("oneOf", syntax::schema_array),
            ("not", syntax::schema),
            ("definitions", syntax::schema_map),
        ]);

        let keywords: IndexMap<&'static str, KeywordRule> = IndexMap::from([
            ("type", types::type_ as KeywordRule),
            ("enum", types::enum_),
            ("minimum", numeric::minimum),
            ("maximum", numeric::maximum),
            ("multipleOf", numeric::multiple_of),
            ("minLength", string::min_length),
            ("maxLength", string::max_length),
            ("pattern", string::pattern),
            ("format", format::keyword),
            ("minItems", array::min_items),
            ("maxItems", array::max_items),
            ("uniqueItems", array::unique_items),
            ("items", array::items),
            ("required", object::required),
            ("minProperties", object::min_properties),
            ("maxProperties", object::max_properties),
            ("properties", object::properties_v4),
            ("patternProperties", object::pattern_properties),
            ("additionalProperties", object::additional_properties),
            ("dependencies", object::dependencies),
            ("allOf", combinators::all_of),
            ("anyOf", combinators::any_of),
            ("oneOf", combinators::one_of),
            ("not", combinators::not),
        ]);

        Self {
            version: SchemaVersion::DraftV4,
            syntax,
            keywords,
            formats: format::draft_v4(),
            validated: SyntaxCache::new(),
        }
    }

    /// The draft these rules implement.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Keywords with a syntax rule, in checking order.
    pub fn keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.syntax.keys().copied()
    }

    /// Format names with a validator.
    pub fn formats(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formats.keys().copied()
    }
}

impl RuleBundle for DraftBundle {
    fn is_syntax_validated(&self, node: &SchemaNode) -> bool {
        self.validated.contains(node)
    }

    fn check_syntax(&self, context: &ValidationContext) -> ValidationReport {
        let mut report = context.report_with_prefix(SCHEMA_REPORT_SUFFIX);
        let node = context.schema_node();
        let Some(Value::Object(schema)) = node.value() else {
            report.error_with_code("invalid_schema", EngineError::NotASchema.to_string());
            return report;
        };

        for (name, rule) in &self.syntax {
            let Some(value) = schema.get(*name) else {
                continue;
            };
            if let Err(message) = rule(value) {
                report.error_with_code("invalid_keyword", format!("keyword \"{}\": {}", name, message));
                if report.is_halted() {
                    break;
                }
            }
        }

        if report.is_success() {
            self.validated.insert(node);
        } else {
            debug!(
                version = %self.version,
                schema = %node.pointer(),
                failures = report.errors().len(),
                "schema failed syntax check"
            );
        }
        report
    }

    fn build_instance_validator<'i>(
        &self,
        context: &ValidationContext,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i> {
        let Some(Value::Object(schema)) = context.current_schema() else {
            let mut report = context.report_with_prefix(SCHEMA_REPORT_SUFFIX);
            report.error_with_code("invalid_schema", EngineError::NotASchema.to_string());
            return Box::new(AlwaysFalseValidator::new(report));
        };

        let rules: Vec<KeywordRule> = if schema.contains_key("$ref") {
            vec![reference::reference]
        } else {
            self.keywords
                .iter()
                .filter(|(name, _)| schema.contains_key(**name))
                .map(|(_, rule)| *rule)
                .collect()
        };
        Box::new(KeywordValidator::new(context.clone(), instance, rules))
    }

    fn build_format_validator<'i>(
        &self,
        context: &ValidationContext,
        format: &str,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i> {
        match self.formats.get(format) {
            Some(rule) => Box::new(FormatValidator::new(context.report(), format, *rule, instance)),
            None => {
                trace!(format, version = %self.version, "unknown format, not checked");
                Box::new(AlwaysTrueValidator::new(context))
            }
        }
    }

    fn prune(&self) {
        self.validated.prune();
    }
}

impl fmt::Debug for DraftBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftBundle")
            .field("version", &self.version)
            .field("keywords", &self.keywords.keys().collect::<Vec<_>>())
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field("validated", &self.validated.len())
            .finish()
    }
}
