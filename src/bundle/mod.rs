//! Rule bundles: the per-draft syntax, instance and format rules.
//!
//! The engine only knows the [`RuleBundle`] contract. [`DraftBundle`] is the
//! bundled implementation for drafts 3 and 4; other rule sets can be plugged
//! into a [`VersionRegistry`](crate::VersionRegistry) in their place.

mod draft;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use crate::location::{NodeId, SchemaNode};
use crate::report::ValidationReport;
use crate::validation::ValidationContext;
use crate::validator::Validator;

pub use draft::DraftBundle;

/// The rules of one schema dialect.
///
/// Implementations are shared by every context of an engine, across threads.
pub trait RuleBundle: Send + Sync {
    /// True when this exact node (by identity) already passed `check_syntax`.
    fn is_syntax_validated(&self, node: &SchemaNode) -> bool;

    /// Checks the current schema node of `context` and returns a report
    /// scoped as a schema-level failure.
    fn check_syntax(&self, context: &ValidationContext) -> ValidationReport;

    /// Builds the validator for `instance` against the current schema node
    /// of `context`. The node has already passed `check_syntax`.
    fn build_instance_validator<'i>(
        &self,
        context: &ValidationContext,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i>;

    /// Builds the validator for the named format.
    fn build_format_validator<'i>(
        &self,
        context: &ValidationContext,
        format: &str,
        instance: &'i Value,
    ) -> Box<dyn Validator + 'i>;

    /// Drops bookkeeping about documents that no longer exist.
    fn prune(&self) {}
}

/// Identity-keyed record of schema nodes that passed syntax checking.
///
/// Each entry keeps a weak handle on the node's document: an entry whose
/// document was dropped is treated as absent, so a later document allocated
/// at the same address is never mistaken for a checked one.
#[derive(Debug, Default)]
pub struct SyntaxCache {
    entries: RwLock<HashMap<NodeId, Weak<Value>>>,
}

impl SyntaxCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `node` was recorded and its document is still alive.
    pub fn contains(&self, node: &SchemaNode) -> bool {
        let Some(id) = node.id() else {
            return false;
        };
        self.entries
            .read()
            .get(&id)
            .and_then(Weak::upgrade)
            .map_or(false, |document| Arc::ptr_eq(&document, node.document()))
    }

    /// Records `node`. Recording a node twice is a no-op.
    pub fn insert(&self, node: &SchemaNode) {
        let Some(id) = node.id() else {
            return;
        };
        let mut entries = self.entries.write();
        let live = entries
            .get(&id)
            .map_or(false, |document| document.strong_count() > 0);
        if !live {
            entries.insert(id, Arc::downgrade(node.document()));
        }
    }

    /// Removes entries whose document was dropped.
    pub fn prune(&self) {
        self.entries.write().retain(|_, document| document.strong_count() > 0);
    }

    /// Number of entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
