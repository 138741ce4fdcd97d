//! Per-path validation failure types.
//!
//! This module provides [`SchemaError`] for a single failure observed at an
//! instance location and [`SchemaErrors`] for a non-empty accumulation of them.

use std::fmt::{self, Display};

use stillwater::prelude::*;

use crate::pointer::JsonPointer;

/// A single validation failure with full context.
///
/// `SchemaError` captures:
/// - **path**: where in the instance the failure was observed
/// - **suffix**: an optional marker appended to the path when rendering
///   (` [schema]` for failures of the schema itself)
/// - **message**: human-readable description
/// - **got** / **expected**: optional details
/// - **code**: machine-readable error code
///
/// # Example
///
/// ```rust
/// use waymark::{JsonPointer, SchemaError};
///
/// let error = SchemaError::new(JsonPointer::root().append("port"), "value too large")
///     .with_code("maximum")
///     .with_expected("at most 65535")
///     .with_got("70000");
///
/// assert_eq!(error.code, "maximum");
/// assert!(error.to_string().starts_with("#/port: value too large"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// The instance location at which the failure was observed.
    pub path: JsonPointer,
    /// Text appended to the rendered path, e.g. ` [schema]`.
    pub suffix: String,
    /// Human-readable error message.
    pub message: String,
    /// The actual value that was received (formatted as string).
    pub got: Option<String>,
    /// Description of what was expected.
    pub expected: Option<String>,
    /// Machine-readable error code (e.g. `ref_loop`).
    pub code: String,
}

impl SchemaError {
    /// Creates a new error at `path` with the given message.
    ///
    /// The error code defaults to "validation_error".
    pub fn new(path: JsonPointer, message: impl Into<String>) -> Self {
        Self {
            path,
            suffix: String::new(),
            message: message.into(),
            got: None,
            expected: None,
            code: "validation_error".to_string(),
        }
    }

    /// Sets the path suffix and returns self for chaining.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the error code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the "got" (actual value) field and returns self for chaining.
    pub fn with_got(mut self, got: impl Into<String>) -> Self {
        self.got = Some(got.into());
        self
    }

    /// Sets the "expected" field and returns self for chaining.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// The rendered scope of this error: path followed by suffix.
    pub fn scope(&self) -> String {
        format!("{}{}", self.path, self.suffix)
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.path, self.suffix, self.message)?;

        if let Some(ref expected) = self.expected {
            write!(f, " (expected: {})", expected)?;
        }
        if let Some(ref got) = self.got {
            write!(f, " (got: {})", got)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaError>();
    assert_sync::<SchemaError>();
};

/// A non-empty collection of validation failures.
///
/// `SchemaErrors` wraps a `NonEmptyVec<SchemaError>` so that it can be the
/// failure side of a `Validation<T, SchemaErrors>`. It implements `Semigroup`,
/// so failures from independent branches combine:
///
/// ```rust
/// use waymark::{JsonPointer, SchemaError, SchemaErrors};
/// use stillwater::prelude::*;
///
/// let left = SchemaErrors::single(SchemaError::new(JsonPointer::root().append("a"), "bad"));
/// let right = SchemaErrors::single(SchemaError::new(JsonPointer::root().append("b"), "worse"));
///
/// assert_eq!(left.combine(right).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaErrors(NonEmptyVec<SchemaError>);

impl SchemaErrors {
    /// Creates a `SchemaErrors` containing a single error.
    pub fn single(error: SchemaError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Creates a `SchemaErrors` from a `NonEmptyVec` of errors.
    pub fn from_non_empty(errors: NonEmptyVec<SchemaError>) -> Self {
        Self(errors)
    }

    /// Returns the number of errors in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    /// Returns all errors observed at the given instance location.
    pub fn at_path(&self, path: &JsonPointer) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| &e.path == path).collect()
    }

    /// Returns all errors with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| e.code == code).collect()
    }

    /// Returns the first error in the collection.
    pub fn first(&self) -> &SchemaError {
        self.0.head()
    }

    /// Converts this collection into a `Vec<SchemaError>`.
    pub fn into_vec(self) -> Vec<SchemaError> {
        self.0.into_vec()
    }

    /// Creates a `SchemaErrors` from a `Vec<SchemaError>`.
    ///
    /// # Panics
    ///
    /// Panics if the provided vec is empty.
    pub fn from_vec(errors: Vec<SchemaError>) -> Self {
        Self(NonEmptyVec::from_vec(errors).expect("SchemaErrors requires at least one error"))
    }
}

impl Semigroup for SchemaErrors {
    fn combine(self, other: Self) -> Self {
        SchemaErrors(self.0.combine(other.0))
    }
}

impl Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

impl IntoIterator for SchemaErrors {
    type Item = SchemaError;
    type IntoIter = std::vec::IntoIter<SchemaError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}
