//! The validator capability.
//!
//! A [`Validator`] is bound to a context and an instance when it is built,
//! and produces a report when run. Rule bundles build [`KeywordValidator`]s;
//! the context itself hands out [`AlwaysFalseValidator`]s whenever a branch
//! cannot be validated (broken schema, dangling pointer, `$ref` loop).

use serde_json::{Map, Value};

use crate::keyword::KeywordRule;
use crate::report::ValidationReport;
use crate::validation::ValidationContext;

/// Checks one instance against the schema it was built for.
pub trait Validator {
    /// Runs the check and returns its report.
    fn validate(&self) -> ValidationReport;
}

/// A validator that always fails with a report built beforehand. The report
/// is expected to carry at least one failure.
#[derive(Debug, Clone)]
pub struct AlwaysFalseValidator {
    report: ValidationReport,
}

impl AlwaysFalseValidator {
    /// Wraps a failed report.
    pub fn new(report: ValidationReport) -> Self {
        Self { report }
    }
}

impl Validator for AlwaysFalseValidator {
    fn validate(&self) -> ValidationReport {
        self.report.clone()
    }
}

/// A validator that always succeeds, with an empty report scoped to the
/// context it was built for.
#[derive(Debug, Clone)]
pub struct AlwaysTrueValidator {
    report: ValidationReport,
}

impl AlwaysTrueValidator {
    /// Builds the validator at `context`'s instance position.
    pub fn new(context: &ValidationContext) -> Self {
        Self {
            report: context.report(),
        }
    }
}

impl Validator for AlwaysTrueValidator {
    fn validate(&self) -> ValidationReport {
        self.report.clone()
    }
}

/// Runs a fixed list of keyword rules against one instance.
pub struct KeywordValidator<'i> {
    context: ValidationContext,
    instance: &'i Value,
    rules: Vec<KeywordRule>,
}

impl<'i> KeywordValidator<'i> {
    pub(crate) fn new(context: ValidationContext, instance: &'i Value, rules: Vec<KeywordRule>) -> Self {
        Self {
            context,
            instance,
            rules,
        }
    }
}

impl Validator for KeywordValidator<'_> {
    fn validate(&self) -> ValidationReport {
        let mut report = self.context.report();
        let empty = Map::new();
        let schema = self
            .context
            .current_schema()
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        for rule in &self.rules {
            rule(&self.context, schema, self.instance, &mut report);
            if report.is_halted() {
                break;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::location::SchemaLocation;
    use crate::registry::VersionRegistry;
    use crate::report::ReportFactory;
    use crate::resolver::DocumentStore;
    use crate::validation::DEFAULT_MAX_DEPTH;
    use serde_json::json;

    fn context() -> ValidationContext {
        let location = SchemaLocation::new(
            Arc::new(json!({"items": {}})),
            Arc::new(DocumentStore::default()),
        );
        ValidationContext::new(
            location,
            Arc::new(VersionRegistry::new()),
            ReportFactory::default(),
            DEFAULT_MAX_DEPTH,
        )
        .unwrap()
    }

    #[test]
    fn test_always_true_reports_success_at_context_path() {
        let ctx = context();
        let child = ctx.relocate(Some("3"), ctx.schema_node().child("items"));

        let report = AlwaysTrueValidator::new(&child).validate();
        assert!(report.is_success());
        assert_eq!(report.path().to_string(), "#/3");
    }

    #[test]
    fn test_always_false_returns_its_report() {
        let ctx = context();
        let mut failed = ctx.report();
        failed.error_with_code("ref_loop", "schema loops on itself");

        let validator = AlwaysFalseValidator::new(failed.clone());
        assert_eq!(validator.validate(), failed);
        assert_eq!(validator.validate(), failed);
    }
}
