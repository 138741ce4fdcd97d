//! # Waymark
//!
//! A JSON Schema validation engine that keeps track of where it is: in the
//! instance, in the schema, and along every `$ref` chain it follows.
//!
//! ## Overview
//!
//! Validation is a recursive walk. Each step runs in a [`ValidationContext`]
//! that knows the instance position (a [`JsonPointer`]), the schema node in
//! scope (a [`SchemaLocation`]), the rules of the schema's draft (through the
//! [`VersionRegistry`]) and the schema nodes already visited by the current
//! `$ref` chain. A reference that comes back to a node on its own chain is
//! reported as a loop instead of recursing forever.
//!
//! Failures come in two kinds. A root schema that is `null` or not an object
//! is a hard [`EngineError`]. Everything else (an instance that does not
//! conform, a broken sub-schema, a dangling or looping `$ref`) is collected in
//! a [`ValidationReport`] and never stops validation of unrelated branches.
//!
//! ## Core Types
//!
//! - [`SchemaEngine`]: entry point, configured through [`EngineBuilder`]
//! - [`ValidationContext`]: per-step validation state
//! - [`ValidationReport`]: failures collected for one instance location
//! - [`JsonPointer`]: RFC 6901 pointers, rendered as `#/a/0`
//! - [`RuleBundle`]: the rules of one schema draft ([`DraftBundle`] for drafts 3 and 4)
//!
//! ## Example
//!
//! ```rust
//! use waymark::SchemaEngine;
//! use serde_json::json;
//!
//! let engine = SchemaEngine::new();
//!
//! let report = engine.validate(json!({"type": "string"}), &json!("hello")).unwrap();
//! assert!(report.is_success());
//!
//! // A schema that refers to itself is reported, not followed forever.
//! let looping = json!({
//!     "definitions": {"x": {"$ref": "#/definitions/x"}},
//!     "$ref": "#/definitions/x"
//! });
//! let report = engine.validate(looping, &json!(1)).unwrap();
//! assert!(report.messages()[0].contains("loops on itself"));
//! ```

pub mod bundle;
pub mod engine;
pub mod error;
pub mod location;
pub mod pointer;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod validation;
pub mod validator;
pub mod version;

mod format;
mod keyword;

pub use bundle::{DraftBundle, RuleBundle, SyntaxCache};
pub use engine::{EngineBuilder, SchemaEngine};
pub use error::{EngineError, ResolveError, SchemaError, SchemaErrors};
pub use location::{NodeId, SchemaLocation, SchemaNode, SchemaRef};
pub use pointer::{JsonPointer, PointerError};
pub use registry::VersionRegistry;
pub use report::{ReportFactory, ReportMode, ValidationReport};
pub use resolver::{DocumentResolver, DocumentStore, FileResolver, FileSystem, StdFileSystem};
pub use validation::{ValidationContext, DEFAULT_MAX_DEPTH, SCHEMA_REPORT_SUFFIX};
pub use validator::{AlwaysFalseValidator, AlwaysTrueValidator, KeywordValidator, Validator};
pub use version::SchemaVersion;

/// Type alias for validation results using SchemaErrors
pub type ValidationResult<T> = stillwater::Validation<T, SchemaErrors>;
