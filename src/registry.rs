//! Version registry: from a schema's `$schema` to the rule bundle that runs it.
//!
//! The registry is built once per engine and read-only afterwards, apart
//! from its caches (compiled patterns here, checked nodes in each bundle).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::bundle::{DraftBundle, RuleBundle};
use crate::error::EngineError;
use crate::version::SchemaVersion;

/// Compiled patterns kept before the cache starts over.
const PATTERN_CACHE_CAPACITY: usize = 1024;

/// Dispatch table from [`SchemaVersion`] to [`RuleBundle`], with a default.
///
/// # Example
///
/// ```rust
/// use waymark::{SchemaVersion, VersionRegistry};
/// use serde_json::json;
///
/// let registry = VersionRegistry::new();
///
/// let v4 = json!({"$schema": "http://json-schema.org/draft-04/schema#"});
/// assert_eq!(registry.resolve_version(Some(&v4)).unwrap(), SchemaVersion::DraftV4);
///
/// // Unknown dialects fall back to the default rather than failing.
/// let other = json!({"$schema": "http://example.com/my-dialect"});
/// assert_eq!(registry.resolve_version(Some(&other)).unwrap(), SchemaVersion::DraftV3);
///
/// assert!(registry.resolve_version(Some(&json!(42))).is_err());
/// ```
pub struct VersionRegistry {
    default: SchemaVersion,
    draft_v3: Arc<dyn RuleBundle>,
    draft_v4: Arc<dyn RuleBundle>,
    patterns: RwLock<HashMap<String, Regex>>,
}

impl VersionRegistry {
    /// Creates a registry with the bundled draft 3 and draft 4 rules, and
    /// draft 3 as the default.
    pub fn new() -> Self {
        Self {
            default: SchemaVersion::DraftV3,
            draft_v3: Arc::new(DraftBundle::draft_v3()),
            draft_v4: Arc::new(DraftBundle::draft_v4()),
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the version used when a schema does not name a known dialect.
    pub fn with_default(mut self, version: SchemaVersion) -> Self {
        self.default = version;
        self
    }

    /// Replaces the rule bundle for `version`.
    pub fn with_bundle(mut self, version: SchemaVersion, bundle: Arc<dyn RuleBundle>) -> Self {
        match version {
            SchemaVersion::DraftV3 => self.draft_v3 = bundle,
            SchemaVersion::DraftV4 => self.draft_v4 = bundle,
        }
        self
    }

    /// The default version.
    pub fn default_version(&self) -> SchemaVersion {
        self.default
    }

    /// Determines the version of a schema node.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NullSchema`] when the node is missing or `null`
    /// - [`EngineError::NotASchema`] when the node is not an object
    ///
    /// A missing or unrecognized `$schema` is not an error: the default
    /// version is returned.
    pub fn resolve_version(&self, schema: Option<&Value>) -> Result<SchemaVersion, EngineError> {
        let object = match schema {
            None | Some(Value::Null) => return Err(EngineError::NullSchema),
            Some(Value::Object(object)) => object,
            Some(_) => return Err(EngineError::NotASchema),
        };

        Ok(object
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(SchemaVersion::from_locator)
            .unwrap_or(self.default))
    }

    /// The rule bundle for `version`.
    pub fn bundle(&self, version: SchemaVersion) -> &dyn RuleBundle {
        match version {
            SchemaVersion::DraftV3 => self.draft_v3.as_ref(),
            SchemaVersion::DraftV4 => self.draft_v4.as_ref(),
        }
    }

    /// Compiles `pattern`, reusing an earlier compilation when there is one.
    ///
    /// The cache holds at most a fixed number of patterns; when it is full it
    /// is emptied before the new pattern goes in.
    pub fn pattern(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self.patterns.read().get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern)?;
        let mut patterns = self.patterns.write();
        if patterns.len() >= PATTERN_CACHE_CAPACITY && !patterns.contains_key(pattern) {
            debug!(capacity = PATTERN_CACHE_CAPACITY, "pattern cache full, clearing");
            patterns.clear();
        }
        Ok(patterns
            .entry(pattern.to_string())
            .or_insert(regex)
            .clone())
    }

    /// Number of compiled patterns currently cached.
    pub fn cached_patterns(&self) -> usize {
        self.patterns.read().len()
    }

    /// Drops cache entries about documents that no longer exist, and the
    /// compiled patterns.
    pub fn prune(&self) {
        for version in SchemaVersion::ALL {
            self.bundle(version).prune();
        }
        self.patterns.write().clear();
    }
}

impl Default for VersionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
