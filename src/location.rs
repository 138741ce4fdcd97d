//! Schema nodes and the location of the schema currently in scope.
//!
//! A [`SchemaNode`] names one node of an immutable, reference-counted schema
//! document by pointer. Its [`NodeId`] is the address of the node inside that
//! document, so two structurally identical sub-schemas are still distinct
//! nodes. A [`SchemaLocation`] pairs the current node with the root document
//! that `#...` references resolve against.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::EngineError;
use crate::pointer::JsonPointer;
use crate::resolver::DocumentStore;

/// Identity of a schema node: the address of the node within its document.
///
/// Identities are only meaningful while the owning document is alive; every
/// holder of a `NodeId` also holds (or weakly checks) the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    fn of(value: &Value) -> Self {
        NodeId(value as *const Value as usize)
    }
}

/// A node inside a shared schema document.
#[derive(Clone)]
pub struct SchemaNode {
    document: Arc<Value>,
    pointer: JsonPointer,
}

impl SchemaNode {
    /// The root node of `document`.
    pub fn root(document: Arc<Value>) -> Self {
        Self {
            document,
            pointer: JsonPointer::root(),
        }
    }

    /// The node at `pointer` within `document`. The node may be missing.
    pub fn at(document: Arc<Value>, pointer: JsonPointer) -> Self {
        Self { document, pointer }
    }

    /// A standalone schema that belongs to no other document.
    pub fn detached(schema: Value) -> Self {
        Self::root(Arc::new(schema))
    }

    /// The child node reached by one more pointer segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        Self {
            document: Arc::clone(&self.document),
            pointer: self.pointer.append(segment),
        }
    }

    /// The child node at an array index.
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// The node's value, or `None` when the pointer resolves to nothing.
    pub fn value(&self) -> Option<&Value> {
        self.pointer.resolve(&self.document)
    }

    /// True when the pointer resolves to nothing.
    pub fn is_missing(&self) -> bool {
        self.value().is_none()
    }

    /// The node's identity, or `None` for a missing node.
    pub fn id(&self) -> Option<NodeId> {
        self.value().map(NodeId::of)
    }

    /// The pointer from the document root to this node.
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// The document this node belongs to.
    pub fn document(&self) -> &Arc<Value> {
        &self.document
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("pointer", &self.pointer.to_string())
            .field("value", &self.value())
            .finish()
    }
}

/// A parsed `$ref` target as far as the location layer is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRef {
    /// A reference into the current document (`#...` or empty).
    Fragment(String),
    /// An absolute URI, possibly with a fragment.
    Absolute(Url),
}

impl SchemaRef {
    /// Classifies `uri`, failing if it is neither absolute nor a bare
    /// fragment reference.
    pub fn parse(uri: &str) -> Result<Self, EngineError> {
        if uri.is_empty() || uri.starts_with('#') {
            return Ok(SchemaRef::Fragment(uri.trim_start_matches('#').to_string()));
        }
        Url::parse(uri)
            .map(SchemaRef::Absolute)
            .map_err(|_| EngineError::InvalidUri(uri.to_string()))
    }

    /// The fragment part, empty when there is none.
    pub fn fragment(&self) -> &str {
        match self {
            SchemaRef::Fragment(fragment) => fragment,
            SchemaRef::Absolute(url) => url.fragment().unwrap_or(""),
        }
    }
}

/// The schema node currently in scope, within a root document.
///
/// Every operation returns a new location; a location is never modified
/// once built.
#[derive(Clone)]
pub struct SchemaLocation {
    root: Arc<Value>,
    base_uri: Option<Url>,
    node: SchemaNode,
    documents: Arc<DocumentStore>,
}

impl SchemaLocation {
    /// A location whose root and current node are both `document`.
    pub fn new(document: Arc<Value>, documents: Arc<DocumentStore>) -> Self {
        Self {
            node: SchemaNode::root(Arc::clone(&document)),
            root: document,
            base_uri: None,
            documents,
        }
    }

    /// A location rooted at the document fetched from the absolute `uri`.
    /// A fragment in `uri` selects the current node within that document.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidUri`] when `uri` is not absolute,
    /// [`EngineError::InvalidPointer`] when its fragment is not a JSON Pointer,
    /// [`EngineError::Resolve`] when the document cannot be fetched.
    pub fn from_uri(uri: &str, documents: Arc<DocumentStore>) -> Result<Self, EngineError> {
        let url = Url::parse(uri).map_err(|_| EngineError::InvalidUri(uri.to_string()))?;
        let pointer = JsonPointer::parse(url.fragment().unwrap_or(""))?;
        let document = documents.fetch(&url)?;

        let mut base = url;
        base.set_fragment(None);
        Ok(Self {
            node: SchemaNode::at(Arc::clone(&document), pointer),
            root: document,
            base_uri: Some(base),
            documents,
        })
    }

    /// The current node.
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// The current node's value, or `None` for the missing marker.
    pub fn schema(&self) -> Option<&Value> {
        self.node.value()
    }

    /// The root document that fragment references resolve against.
    pub fn root(&self) -> &Arc<Value> {
        &self.root
    }

    /// The absolute URI of the root document, when it was fetched by URI.
    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// The document store used for URI redirection.
    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.documents
    }

    /// Same root, different current node.
    pub fn with_node(&self, node: SchemaNode) -> Self {
        Self {
            node,
            ..self.clone()
        }
    }

    /// The node at `pointer` from the root document. The result's node is
    /// missing when any segment fails to resolve.
    pub fn at_pointer(&self, pointer: &JsonPointer) -> Self {
        trace!(pointer = %pointer, "resolving pointer against root schema");
        self.with_node(SchemaNode::at(Arc::clone(&self.root), pointer.clone()))
    }

    /// Redirects the root to the document at `uri`.
    ///
    /// A bare fragment reference leaves the location unchanged; the fragment
    /// itself is for the caller to follow.
    pub fn at_uri(&self, uri: &str) -> Result<Self, EngineError> {
        match SchemaRef::parse(uri)? {
            SchemaRef::Fragment(_) => Ok(self.clone()),
            SchemaRef::Absolute(url) => {
                let document = self.documents.fetch(&url)?;
                let mut base = url;
                base.set_fragment(None);
                Ok(Self {
                    node: SchemaNode::root(Arc::clone(&document)),
                    root: document,
                    base_uri: Some(base),
                    documents: Arc::clone(&self.documents),
                })
            }
        }
    }
}

impl fmt::Debug for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLocation")
            .field("base_uri", &self.base_uri.as_ref().map(Url::as_str))
            .field("node", &self.node)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use serde_json::json;

    fn store() -> Arc<DocumentStore> {
        Arc::new(DocumentStore::new(|uri: &Url| -> Result<Value, ResolveError> {
            match uri.as_str() {
                "mem://schemas/other" => Ok(json!({"definitions": {"a": {"type": "null"}}})),
                _ => Err(ResolveError::NotFound(uri.to_string())),
            }
        }))
    }

    fn location(schema: Value) -> SchemaLocation {
        SchemaLocation::new(Arc::new(schema), store())
    }

    #[test]
    fn test_identical_subschemas_are_distinct_nodes() {
        let doc = Arc::new(json!({"a": {"type": "string"}, "b": {"type": "string"}}));
        let a = SchemaNode::root(Arc::clone(&doc)).child("a");
        let b = SchemaNode::root(Arc::clone(&doc)).child("b");

        assert_eq!(a.value(), b.value());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), SchemaNode::root(doc).child("a").id());
    }

    #[test]
    fn test_missing_node() {
        let node = SchemaNode::detached(json!({})).child("nope");
        assert!(node.is_missing());
        assert!(node.id().is_none());
    }

    #[test]
    fn test_with_node_keeps_root() {
        let loc = location(json!({"properties": {"a": {"type": "string"}}}));
        let child = loc.with_node(loc.node().child("properties").child("a"));

        assert_eq!(child.schema(), Some(&json!({"type": "string"})));
        assert!(Arc::ptr_eq(child.root(), loc.root()));
        assert_eq!(loc.schema(), Some(&json!({"properties": {"a": {"type": "string"}}})));
    }

    #[test]
    fn test_at_pointer_resolves_from_root() {
        let loc = location(json!({"definitions": {"x": {"minimum": 1}}, "items": {}}));
        let nested = loc.with_node(loc.node().child("items"));

        let found = nested.at_pointer(&JsonPointer::from_segments(["definitions", "x"]));
        assert_eq!(found.schema(), Some(&json!({"minimum": 1})));

        let missing = nested.at_pointer(&JsonPointer::from_segments(["definitions", "y"]));
        assert!(missing.schema().is_none());
    }

    #[test]
    fn test_at_uri_fragment_is_noop() {
        let loc = location(json!({"type": "string"}));
        let same = loc.at_uri("#/definitions/x").unwrap();
        assert!(Arc::ptr_eq(same.root(), loc.root()));
        assert_eq!(same.node().id(), loc.node().id());
        assert!(same.base_uri().is_none());
    }

    #[test]
    fn test_at_uri_absolute_redirects_root() {
        let loc = location(json!({}));
        let other = loc.at_uri("mem://schemas/other#/definitions/a").unwrap();

        assert_eq!(other.base_uri().map(Url::as_str), Some("mem://schemas/other"));
        assert!(other.schema().unwrap().get("definitions").is_some());

        let again = loc.at_uri("mem://schemas/other").unwrap();
        assert!(Arc::ptr_eq(other.root(), again.root()));
    }

    #[test]
    fn test_at_uri_rejects_relative() {
        let loc = location(json!({}));
        assert!(matches!(
            loc.at_uri("other.json#/a"),
            Err(EngineError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_at_uri_fetch_failure() {
        let loc = location(json!({}));
        assert!(matches!(
            loc.at_uri("mem://schemas/unknown"),
            Err(EngineError::Resolve(ResolveError::NotFound(_)))
        ));
    }

    #[test]
    fn test_from_uri() {
        let loc = SchemaLocation::from_uri("mem://schemas/other#/definitions/a", store()).unwrap();
        assert_eq!(loc.schema(), Some(&json!({"type": "null"})));
        assert_eq!(loc.base_uri().map(Url::as_str), Some("mem://schemas/other"));
        assert!(loc.root().get("definitions").is_some());

        assert!(matches!(
            SchemaLocation::from_uri("other", store()),
            Err(EngineError::InvalidUri(_))
        ));
        assert!(matches!(
            SchemaLocation::from_uri("mem://schemas/other#definitions", store()),
            Err(EngineError::InvalidPointer(_))
        ));
    }

    #[test]
    fn test_schema_ref_parse() {
        assert_eq!(
            SchemaRef::parse("#/a").unwrap(),
            SchemaRef::Fragment("/a".to_string())
        );
        assert_eq!(SchemaRef::parse("").unwrap().fragment(), "");
        let absolute = SchemaRef::parse("http://x.org/s#/definitions/b").unwrap();
        assert_eq!(absolute.fragment(), "/definitions/b");
    }
}
