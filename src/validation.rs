//! Validation context: the state carried through every recursive step.
//!
//! A [`ValidationContext`] knows where validation stands in the instance
//! (a [`JsonPointer`]), which schema node is in scope (a [`SchemaLocation`]),
//! how to dispatch to the rules of the schema's draft, and which schema nodes
//! the current `$ref` chain has already visited.
//!
//! Contexts are immutable. Descending into a sub-schema, redirecting to
//! another document or following a `$ref` pointer all spawn a new context.
//!
//! # Reference loops
//!
//! The set of visited nodes is shared between a context and its children
//! until one of them records a new node, at which point that child gets its
//! own copy. Siblings therefore never see each other's visits. Moving the
//! instance cursor (`relocate` with a segment) starts a fresh set, since a
//! recursive schema applied to a deeper instance is not a loop.
//!
//! # Depth
//!
//! Only moves of the instance cursor count towards the depth limit. Spawns
//! at the same instance position are bounded by the finite schema and by
//! the reference set.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::EngineError;
use crate::location::{NodeId, SchemaLocation, SchemaNode};
use crate::pointer::JsonPointer;
use crate::registry::VersionRegistry;
use crate::report::{ReportFactory, ValidationReport};
use crate::validator::{AlwaysFalseValidator, Validator};

/// Default maximum instance nesting depth. Deeper than anything `serde_json`
/// parses with its default recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Suffix marking reports about the schema itself rather than the instance.
pub const SCHEMA_REPORT_SUFFIX: &str = " [schema]";

/// State accompanying one step of a validation run.
#[derive(Clone)]
pub struct ValidationContext {
    location: SchemaLocation,
    path: JsonPointer,
    registry: Arc<VersionRegistry>,
    reports: ReportFactory,
    ref_lookups: Arc<HashSet<NodeId>>,
    depth: usize,
    max_depth: usize,
}

impl ValidationContext {
    /// Creates the root context of a validation run.
    ///
    /// # Errors
    ///
    /// Fails when the root schema is missing, `null` or not an object. This is
    /// the only hard failure of a validation run.
    pub fn new(
        location: SchemaLocation,
        registry: Arc<VersionRegistry>,
        reports: ReportFactory,
        max_depth: usize,
    ) -> Result<Self, EngineError> {
        registry.resolve_version(location.schema())?;

        let ref_lookups = Arc::new(seeded_lookups(location.node()));
        Ok(Self {
            location,
            path: JsonPointer::root(),
            registry,
            reports,
            ref_lookups,
            depth: 0,
            max_depth,
        })
    }

    fn spawn(
        &self,
        path: JsonPointer,
        location: SchemaLocation,
        ref_lookups: Arc<HashSet<NodeId>>,
        depth: usize,
    ) -> Self {
        Self {
            location,
            path,
            registry: Arc::clone(&self.registry),
            reports: self.reports,
            ref_lookups,
            depth,
            max_depth: self.max_depth,
        }
    }

    /// The schema node in scope (not the root schema), or `None` if missing.
    pub fn current_schema(&self) -> Option<&Value> {
        self.location.schema()
    }

    /// The schema node in scope, as a navigable node.
    pub fn schema_node(&self) -> &SchemaNode {
        self.location.node()
    }

    /// The schema location in scope.
    pub fn location(&self) -> &SchemaLocation {
        &self.location
    }

    /// The position within the instance.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// The URI of the root schema document, when it was fetched by URI.
    pub fn base_uri(&self) -> Option<&Url> {
        self.location.base_uri()
    }

    /// Instance nesting depth: the number of segments the instance cursor
    /// moved through since the root context.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The version registry shared by the whole run.
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// True when `node` was visited by the current `$ref` chain.
    pub fn has_visited(&self, node: &SchemaNode) -> bool {
        node.id().map_or(false, |id| self.ref_lookups.contains(&id))
    }

    /// Spawns a context for `sub_schema`.
    ///
    /// With `Some(segment)` the instance position moves one level down (the
    /// empty string is a valid segment) and reference tracking restarts from
    /// `sub_schema`. With `None` only the schema changes, as in
    /// [`with_schema`](Self::with_schema).
    pub fn relocate(&self, segment: Option<&str>, sub_schema: SchemaNode) -> Self {
        match segment {
            Some(segment) => {
                let ref_lookups = Arc::new(seeded_lookups(&sub_schema));
                self.spawn(
                    self.path.append(segment),
                    self.location.with_node(sub_schema),
                    ref_lookups,
                    self.depth + 1,
                )
            }
            None => self.with_schema(sub_schema),
        }
    }

    /// Spawns a context for `sub_schema` at the same instance position.
    pub fn with_schema(&self, sub_schema: SchemaNode) -> Self {
        self.spawn(
            self.path.clone(),
            self.location.with_node(sub_schema),
            Arc::clone(&self.ref_lookups),
            self.depth,
        )
    }

    /// Spawns a context whose root schema is the document at `uri`.
    ///
    /// The instance position does not change. A bare fragment reference
    /// (`#...`) keeps the current root; following the fragment is up to
    /// [`acquire_validator_at`](Self::acquire_validator_at).
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidUri`] when `uri` is neither absolute nor a bare
    /// fragment, [`EngineError::Resolve`] when the document cannot be fetched.
    pub fn follow_uri(&self, uri: &str) -> Result<Self, EngineError> {
        let location = self.location.at_uri(uri)?;
        Ok(self.spawn(
            self.path.clone(),
            location,
            Arc::clone(&self.ref_lookups),
            self.depth,
        ))
    }

    /// Checks the syntax of the schema in scope.
    ///
    /// A schema that is not an object is reported, not raised.
    pub fn ensure_schema_valid(&self) -> ValidationReport {
        let version = match self.registry.resolve_version(self.current_schema()) {
            Ok(version) => version,
            Err(e) => {
                let mut report = self.report_with_prefix(SCHEMA_REPORT_SUFFIX);
                report.error_with_code("invalid_schema", e.to_string());
                return report;
            }
        };

        let bundle = self.registry.bundle(version);
        if bundle.is_syntax_validated(self.schema_node()) {
            return self.report();
        }
        bundle.check_syntax(self)
    }

    /// Returns the validator for `instance` against the schema in scope.
    ///
    /// Never fails: a broken schema yields a validator that always reports
    /// the breakage.
    pub fn acquire_validator<'i>(&self, instance: &'i Value) -> Box<dyn Validator + 'i> {
        if self.depth > self.max_depth {
            warn!(path = %self.path, max_depth = self.max_depth, "validation depth limit reached");
            let mut report = self.report();
            report.error_with_code(
                "max_depth_exceeded",
                format!("maximum validation depth {} exceeded", self.max_depth),
            );
            return Box::new(AlwaysFalseValidator::new(report));
        }

        let report = self.ensure_schema_valid();
        if !report.is_success() {
            return Box::new(AlwaysFalseValidator::new(report));
        }

        match self.registry.resolve_version(self.current_schema()) {
            Ok(version) => self
                .registry
                .bundle(version)
                .build_instance_validator(self, instance),
            Err(e) => self.schema_failure(e),
        }
    }

    /// Returns the validator for the named format.
    pub fn acquire_format_validator<'i>(
        &self,
        format: &str,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i> {
        match self.registry.resolve_version(self.current_schema()) {
            Ok(version) => self
                .registry
                .bundle(version)
                .build_format_validator(self, format, instance),
            Err(e) => self.schema_failure(e),
        }
    }

    /// Returns the validator for `instance` against the schema at `pointer`,
    /// resolved from the root schema document (not from the node in scope).
    ///
    /// The lookup happens in a child context that records the target node in
    /// the `$ref` chain. A target that does not exist, or that the chain has
    /// already visited, yields an always-failing validator.
    pub fn acquire_validator_at<'i>(
        &self,
        pointer: &JsonPointer,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i> {
        let mut report = self.report();
        trace!(pointer = %pointer, from = %self.schema_node().pointer(), "looking up schema pointer");

        let location = self.location.at_pointer(pointer);
        let (Some(schema), Some(id)) = (location.schema(), location.node().id()) else {
            debug!(pointer = %pointer, "no schema at pointer");
            report.error_with_code("ref_missing", format!("no match in schema for path {}", pointer));
            return Box::new(AlwaysFalseValidator::new(report));
        };

        if self.ref_lookups.contains(&id) {
            debug!(pointer = %pointer, lineage = self.ref_lookups.len(), "ref loop detected");
            report.error_with_code("ref_loop", format!("schema {} loops on itself", schema));
            return Box::new(AlwaysFalseValidator::new(report));
        }

        let mut ref_lookups = Arc::clone(&self.ref_lookups);
        Arc::make_mut(&mut ref_lookups).insert(id);
        self.spawn(self.path.clone(), location, ref_lookups, self.depth)
            .acquire_validator(instance)
    }

    /// An empty report scoped to this context's instance position.
    pub fn report(&self) -> ValidationReport {
        self.reports.create(&self.path, "")
    }

    /// An empty report scoped to this context's instance position followed
    /// by `prefix`.
    pub fn report_with_prefix(&self, prefix: &str) -> ValidationReport {
        self.reports.create(&self.path, prefix)
    }

    /// Compiles a schema pattern through the registry's cache.
    pub fn pattern(&self, pattern: &str) -> Result<Regex, regex::Error> {
        self.registry.pattern(pattern)
    }

    fn schema_failure<'i>(&self, error: EngineError) -> Box<dyn Validator + 'i> {
        let mut report = self.report_with_prefix(SCHEMA_REPORT_SUFFIX);
        report.error_with_code("invalid_schema", error.to_string());
        Box::new(AlwaysFalseValidator::new(report))
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext")
            .field("path", &self.path.to_string())
            .field("location", &self.location)
            .field("ref_lookups", &self.ref_lookups.len())
            .field("depth", &self.depth)
            .finish()
    }
}

fn seeded_lookups(node: &SchemaNode) -> HashSet<NodeId> {
    node.id().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DocumentStore;
    use serde_json::json;

    fn context(schema: Value) -> Result<ValidationContext, EngineError> {
        let location = SchemaLocation::new(Arc::new(schema), Arc::new(DocumentStore::default()));
        ValidationContext::new(
            location,
            Arc::new(VersionRegistry::new()),
            ReportFactory::default(),
            DEFAULT_MAX_DEPTH,
        )
    }

    #[test]
    fn test_root_schema_must_be_object() {
        assert!(matches!(context(Value::Null), Err(EngineError::NullSchema)));
        assert!(matches!(context(json!("string")), Err(EngineError::NotASchema)));
        assert!(context(json!({})).is_ok());
    }

    #[test]
    fn test_root_is_seeded() {
        let ctx = context(json!({})).unwrap();
        assert!(ctx.has_visited(ctx.schema_node()));
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.path().is_root());
    }

    #[test]
    fn test_relocate_moves_instance_cursor() {
        let ctx = context(json!({"properties": {"a": {"type": "string"}}})).unwrap();
        let node = ctx.schema_node().child("properties").child("a");

        let child = ctx.relocate(Some("a"), node.clone());
        assert_eq!(child.path().to_string(), "#/a");
        assert_eq!(child.current_schema(), Some(&json!({"type": "string"})));
        assert!(child.has_visited(&node));
        assert!(!child.has_visited(ctx.schema_node()));
        assert_eq!(child.depth(), 1);

        let same_path = ctx.relocate(None, node);
        assert!(same_path.path().is_root());
        assert!(same_path.has_visited(ctx.schema_node()));

        let empty_segment = ctx.relocate(Some(""), ctx.schema_node().clone());
        assert_eq!(empty_segment.path().to_string(), "#/");
    }

    #[test]
    fn test_with_schema_keeps_path_and_lineage() {
        let ctx = context(json!({"allOf": [{}]})).unwrap();
        let child = ctx.with_schema(ctx.schema_node().child("allOf").index(0));
        assert_eq!(child.path(), ctx.path());
        assert!(child.has_visited(ctx.schema_node()));
        assert_eq!(child.depth(), 0);
    }

    #[test]
    fn test_follow_uri_rejects_relative() {
        let ctx = context(json!({})).unwrap();
        assert!(matches!(
            ctx.follow_uri("relative/path.json"),
            Err(EngineError::InvalidUri(_))
        ));
        let same = ctx.follow_uri("#/definitions/a").unwrap();
        assert_eq!(same.schema_node().id(), ctx.schema_node().id());
    }

    #[test]
    fn test_ensure_schema_valid_reports_non_object() {
        let ctx = context(json!({"items": 3})).unwrap();
        let child = ctx.relocate(Some("0"), ctx.schema_node().child("items"));
        let report = child.ensure_schema_valid();

        assert!(!report.is_success());
        assert_eq!(report.messages(), vec!["#/0 [schema]: not a schema (not an object)"]);
    }

    #[test]
    fn test_acquire_validator_at_missing_pointer() {
        let ctx = context(json!({"properties": {"a": {"type": "string"}}})).unwrap();
        let pointer = JsonPointer::from_segments(["properties", "b"]);
        let report = ctx.acquire_validator_at(&pointer, &json!("x")).validate();

        assert!(!report.is_success());
        assert_eq!(
            report.messages(),
            vec!["#: no match in schema for path #/properties/b"]
        );
    }

    #[test]
    fn test_acquire_validator_at_detects_root_loop() {
        let ctx = context(json!({"type": "string"})).unwrap();
        let report = ctx
            .acquire_validator_at(&JsonPointer::root(), &json!("x"))
            .validate();

        assert!(!report.is_success());
        assert!(report.messages()[0].contains("loops on itself"));
        assert_eq!(report.errors()[0].code, "ref_loop");
    }

    #[test]
    fn test_acquire_validator_at_does_not_move_caller() {
        let ctx = context(json!({"definitions": {"x": {"type": "integer"}}})).unwrap();
        let pointer = JsonPointer::from_segments(["definitions", "x"]);

        assert!(ctx.acquire_validator_at(&pointer, &json!(3)).validate().is_success());
        assert!(!ctx.acquire_validator_at(&pointer, &json!("3")).validate().is_success());
        assert_eq!(ctx.schema_node().pointer(), &JsonPointer::root());
        assert!(!ctx.has_visited(&ctx.schema_node().child("definitions").child("x")));
    }

    #[test]
    fn test_depth_limit() {
        let location = SchemaLocation::new(Arc::new(json!({})), Arc::new(DocumentStore::default()));
        let ctx = ValidationContext::new(
            location,
            Arc::new(VersionRegistry::new()),
            ReportFactory::default(),
            1,
        )
        .unwrap();

        let same_position = ctx
            .with_schema(ctx.schema_node().clone())
            .with_schema(ctx.schema_node().clone())
            .follow_uri("#")
            .unwrap();
        assert_eq!(same_position.depth(), 0);
        assert!(same_position.acquire_validator(&json!(1)).validate().is_success());

        let deep = ctx
            .relocate(Some("a"), ctx.schema_node().clone())
            .relocate(Some("b"), ctx.schema_node().clone());
        let report = deep.acquire_validator(&json!(1)).validate();
        assert_eq!(report.errors()[0].code, "max_depth_exceeded");
        assert_eq!(report.errors()[0].scope(), "#/a/b");
    }
}
