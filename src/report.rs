//! Path-scoped validation reports.
//!
//! A [`ValidationReport`] is created for one instance location (plus an
//! optional suffix) and accumulates failures in order. Reports from child
//! validations are merged into their parent's report; a report with no
//! failures is a success.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use stillwater::Validation;

use crate::error::{SchemaError, SchemaErrors};
use crate::pointer::JsonPointer;
use crate::ValidationResult;

/// How reports handle failures after the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Keep every failure.
    #[default]
    Accumulate,
    /// Keep only the first failure; keyword loops stop once a report fails.
    FailFast,
}

/// Creates reports for validation contexts.
///
/// One factory is shared by every context spawned from a top-level
/// validation call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFactory {
    mode: ReportMode,
}

impl ReportFactory {
    /// Creates a factory producing reports in the given mode.
    pub fn new(mode: ReportMode) -> Self {
        Self { mode }
    }

    /// Returns the mode of reports produced by this factory.
    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Creates an empty report scoped to `path` followed by `suffix`.
    pub fn create(&self, path: &JsonPointer, suffix: &str) -> ValidationReport {
        ValidationReport {
            path: path.clone(),
            suffix: suffix.to_string(),
            mode: self.mode,
            errors: Vec::new(),
        }
    }
}

/// An ordered collection of failures scoped to one instance location.
///
/// # Example
///
/// ```rust
/// use waymark::{JsonPointer, ReportFactory};
///
/// let factory = ReportFactory::default();
/// let mut report = factory.create(&JsonPointer::root().append("age"), "");
/// assert!(report.is_success());
///
/// report.error("number is lower than the required minimum");
/// assert!(!report.is_success());
/// assert_eq!(
///     report.messages(),
///     vec!["#/age: number is lower than the required minimum".to_string()]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    path: JsonPointer,
    suffix: String,
    mode: ReportMode,
    errors: Vec<SchemaError>,
}

impl ValidationReport {
    /// The instance location this report is scoped to.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// The rendered scope: path followed by suffix.
    pub fn scope(&self) -> String {
        format!("{}{}", self.path, self.suffix)
    }

    /// True when no failure has been recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when a fail-fast report already holds its failure.
    pub fn is_halted(&self) -> bool {
        self.mode == ReportMode::FailFast && !self.errors.is_empty()
    }

    /// Records a failure at this report's scope.
    pub fn error(&mut self, message: impl Into<String>) {
        let error = SchemaError::new(self.path.clone(), message).with_suffix(self.suffix.clone());
        self.push(error);
    }

    /// Records a failure with a machine-readable code.
    pub fn error_with_code(&mut self, code: &str, message: impl Into<String>) {
        let error = SchemaError::new(self.path.clone(), message)
            .with_suffix(self.suffix.clone())
            .with_code(code);
        self.push(error);
    }

    /// Records a prebuilt failure, typically one carrying got/expected details.
    pub fn push(&mut self, error: SchemaError) {
        if !self.is_halted() {
            self.errors.push(error);
        }
    }

    /// Appends every failure of `other`, keeping their own scopes.
    pub fn merge(&mut self, other: ValidationReport) {
        for error in other.errors {
            self.push(error);
        }
    }

    /// The recorded failures, in order.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    /// Rendered failure messages, each prefixed with its scope.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Failure messages grouped by scope, in first-seen order.
    pub fn grouped(&self) -> IndexMap<String, Vec<String>> {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for error in &self.errors {
            groups
                .entry(error.scope())
                .or_default()
                .push(error.message.clone());
        }
        groups
    }

    /// Consumes the report, returning its failures.
    pub fn into_errors(self) -> Vec<SchemaError> {
        self.errors
    }

    /// Converts the report into a stillwater `Validation`.
    pub fn into_validation(self) -> ValidationResult<()> {
        if self.errors.is_empty() {
            Validation::Success(())
        } else {
            Validation::Failure(SchemaErrors::from_vec(self.errors))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "{}: success", self.scope());
        }
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}
