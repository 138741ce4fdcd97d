//! The top-level entry point.
//!
//! A [`SchemaEngine`] owns everything that outlives a single validation run:
//! the version registry (with its caches), the document store and the report
//! settings. It is cheap to share across threads.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::bundle::RuleBundle;
use crate::error::EngineError;
use crate::location::SchemaLocation;
use crate::registry::VersionRegistry;
use crate::report::{ReportFactory, ReportMode, ValidationReport};
use crate::resolver::{DocumentResolver, DocumentStore, FileResolver};
use crate::validation::{ValidationContext, DEFAULT_MAX_DEPTH};
use crate::version::SchemaVersion;
use crate::ValidationResult;

/// Validates JSON instances against JSON Schemas.
///
/// # Example
///
/// ```rust
/// use waymark::SchemaEngine;
/// use serde_json::json;
///
/// let engine = SchemaEngine::new();
/// let schema = json!({
///     "properties": {
///         "name": {"type": "string", "required": true},
///         "age": {"type": "integer", "minimum": 0}
///     }
/// });
///
/// let report = engine.validate(schema.clone(), &json!({"name": "Ada", "age": 36})).unwrap();
/// assert!(report.is_success());
///
/// let report = engine.validate(schema, &json!({"age": -1})).unwrap();
/// assert_eq!(report.errors().len(), 2);
///
/// // Only an unusable root schema is a hard error.
/// assert!(engine.validate(json!(null), &json!(1)).is_err());
/// ```
pub struct SchemaEngine {
    registry: Arc<VersionRegistry>,
    documents: Arc<DocumentStore>,
    reports: ReportFactory,
    max_depth: usize,
}

impl SchemaEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The root validation context for `schema`.
    ///
    /// Passing the same `Arc` across calls lets the syntax cache recognize
    /// nodes it has already checked.
    pub fn context(&self, schema: impl Into<Arc<Value>>) -> Result<ValidationContext, EngineError> {
        let location = SchemaLocation::new(schema.into(), Arc::clone(&self.documents));
        ValidationContext::new(location, Arc::clone(&self.registry), self.reports, self.max_depth)
    }

    /// The root validation context for the schema at the absolute `uri`.
    pub fn context_at_uri(&self, uri: &str) -> Result<ValidationContext, EngineError> {
        let location = SchemaLocation::from_uri(uri, Arc::clone(&self.documents))?;
        ValidationContext::new(location, Arc::clone(&self.registry), self.reports, self.max_depth)
    }

    /// Validates `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Fails only when the root schema is `null` or not an object. Every
    /// other problem, including broken sub-schemas and `$ref` loops, is
    /// reported in the returned [`ValidationReport`].
    pub fn validate(
        &self,
        schema: impl Into<Arc<Value>>,
        instance: &Value,
    ) -> Result<ValidationReport, EngineError> {
        let context = self.context(schema)?;
        Ok(run(&context, instance))
    }

    /// Validates `instance` against the schema at the absolute `uri`.
    pub fn validate_uri(&self, uri: &str, instance: &Value) -> Result<ValidationReport, EngineError> {
        let context = self.context_at_uri(uri)?;
        Ok(run(&context, instance))
    }

    /// Validates several instances against one schema in parallel.
    ///
    /// Reports come back in the order of `instances`.
    pub fn validate_many(
        &self,
        schema: impl Into<Arc<Value>>,
        instances: &[Value],
    ) -> Result<Vec<ValidationReport>, EngineError> {
        let context = self.context(schema)?;
        debug!(instances = instances.len(), "validating instances in parallel");
        Ok(instances
            .par_iter()
            .map(|instance| run(&context, instance))
            .collect())
    }

    /// Validates `instance` and converts the outcome into a stillwater
    /// `Validation`.
    pub fn check(
        &self,
        schema: impl Into<Arc<Value>>,
        instance: &Value,
    ) -> Result<ValidationResult<()>, EngineError> {
        self.validate(schema, instance)
            .map(ValidationReport::into_validation)
    }

    /// Makes `document` available to `$ref`s under the absolute `uri`.
    ///
    /// A document already stored under `uri` is kept.
    pub fn register_document(&self, uri: &str, document: Value) -> Result<(), EngineError> {
        let url = Url::parse(uri).map_err(|_| EngineError::InvalidUri(uri.to_string()))?;
        self.documents.insert(&url, document);
        Ok(())
    }

    /// Drops cached syntax checks about schemas that no longer exist.
    pub fn prune_caches(&self) {
        self.registry.prune();
    }

    /// The version registry.
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// The document store.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// The maximum instance nesting depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The report mode.
    pub fn report_mode(&self) -> ReportMode {
        self.reports.mode()
    }
}

impl Default for SchemaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaEngine")
            .field("default_version", &self.registry.default_version())
            .field("documents", &self.documents.len())
            .field("report_mode", &self.reports.mode())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaEngine>();
    assert_sync::<SchemaEngine>();
    assert_send::<ValidationContext>();
    assert_sync::<ValidationContext>();
};

fn run(context: &ValidationContext, instance: &Value) -> ValidationReport {
    let validator = context.acquire_validator(instance);
    validator.validate()
}

/// Builder for [`SchemaEngine`].
///
/// # Example
///
/// ```rust
/// use waymark::{ReportMode, SchemaEngine, SchemaVersion};
///
/// let engine = SchemaEngine::builder()
///     .with_default_version(SchemaVersion::DraftV4)
///     .with_report_mode(ReportMode::FailFast)
///     .with_max_depth(50)
///     .build();
///
/// assert_eq!(engine.registry().default_version(), SchemaVersion::DraftV4);
/// assert_eq!(engine.max_depth(), 50);
/// ```
pub struct EngineBuilder {
    default_version: SchemaVersion,
    max_depth: usize,
    report_mode: ReportMode,
    resolver: Option<Box<dyn DocumentResolver>>,
    documents: Vec<(Url, Value)>,
    bundles: Vec<(SchemaVersion, Arc<dyn RuleBundle>)>,
}

impl EngineBuilder {
    /// Sets the version used for schemas without a known `$schema`.
    pub fn with_default_version(mut self, version: SchemaVersion) -> Self {
        self.default_version = version;
        self
    }

    /// Bounds how deep into the instance a run descends.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets how reports treat failures after the first.
    pub fn with_report_mode(mut self, mode: ReportMode) -> Self {
        self.report_mode = mode;
        self
    }

    /// Sets the resolver for documents referenced by absolute URI.
    pub fn with_resolver(mut self, resolver: impl DocumentResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Preloads a document under `uri`.
    pub fn with_document(mut self, uri: Url, document: Value) -> Self {
        self.documents.push((uri, document));
        self
    }

    /// Replaces the rules used for `version`.
    pub fn with_bundle(mut self, version: SchemaVersion, bundle: Arc<dyn RuleBundle>) -> Self {
        self.bundles.push((version, bundle));
        self
    }

    /// Builds the engine.
    pub fn build(self) -> SchemaEngine {
        let registry = self
            .bundles
            .into_iter()
            .fold(VersionRegistry::new().with_default(self.default_version), |registry, (version, bundle)| {
                registry.with_bundle(version, bundle)
            });

        let documents = match self.resolver {
            Some(resolver) => DocumentStore::from_boxed(resolver),
            None => DocumentStore::new(FileResolver::new()),
        };
        for (uri, document) in self.documents {
            documents.insert(&uri, document);
        }

        SchemaEngine {
            registry: Arc::new(registry),
            documents: Arc::new(documents),
            reports: ReportFactory::new(self.report_mode),
            max_depth: self.max_depth,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            default_version: SchemaVersion::DraftV3,
            max_depth: DEFAULT_MAX_DEPTH,
            report_mode: ReportMode::default(),
            resolver: None,
            documents: Vec::new(),
            bundles: Vec::new(),
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("default_version", &self.default_version)
            .field("max_depth", &self.max_depth)
            .field("report_mode", &self.report_mode)
            .field("documents", &self.documents.len())
            .field("bundles", &self.bundles.len())
            .finish()
    }
}
