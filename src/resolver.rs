//! Fetching schema documents by absolute URI.
//!
//! The engine never performs I/O itself. It asks a [`DocumentResolver`] for
//! documents it has not seen yet and keeps them in a [`DocumentStore`], so
//! that every `$ref` to the same document lands on the same nodes.
//!
//! [`FileResolver`] handles `file:` URIs through the [`FileSystem`]
//! abstraction, which lets tests substitute an in-memory filesystem.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::ResolveError;

/// Fetches a JSON document given its absolute URI (fragment already removed).
pub trait DocumentResolver: Send + Sync {
    /// Returns the parsed document at `uri`.
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError>;
}

impl<F> DocumentResolver for F
where
    F: Fn(&Url) -> Result<Value, ResolveError> + Send + Sync,
{
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError> {
        self(uri)
    }
}

/// Abstraction for filesystem reads.
pub trait FileSystem: Send + Sync {
    /// The error type for filesystem operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the contents of a file as a string.
    fn read_file(&self, path: &Path) -> Result<String, Self::Error>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    type Error = std::io::Error;

    fn read_file(&self, path: &Path) -> Result<String, Self::Error> {
        std::fs::read_to_string(path)
    }
}

/// Resolves `file:` URIs by reading and parsing the file.
///
/// Any other scheme fails with [`ResolveError::UnsupportedScheme`].
#[derive(Debug, Clone, Default)]
pub struct FileResolver<F = StdFileSystem> {
    fs: F,
}

impl FileResolver<StdFileSystem> {
    /// Creates a resolver over the real filesystem.
    pub fn new() -> Self {
        Self { fs: StdFileSystem }
    }
}

impl<F: FileSystem> FileResolver<F> {
    /// Creates a resolver over the given filesystem.
    pub fn with_filesystem(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> DocumentResolver for FileResolver<F> {
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError> {
        if uri.scheme() != "file" {
            return Err(ResolveError::UnsupportedScheme(uri.to_string()));
        }
        let path = uri
            .to_file_path()
            .map_err(|()| ResolveError::NotAFile(uri.to_string()))?;

        let content = self
            .fs
            .read_file(&path)
            .map_err(|e| ResolveError::Io(path.clone(), Box::new(e)))?;

        serde_json::from_str(&content).map_err(|e| ResolveError::Parse(uri.to_string(), e))
    }
}

/// Cache of documents keyed by absolute URI without fragment.
///
/// Entries are inserted at most once per URI: a concurrent second fetch of
/// the same URI returns the document stored by the first one, so node
/// identities stay stable for the lifetime of the store.
pub struct DocumentStore {
    resolver: Box<dyn DocumentResolver>,
    documents: RwLock<HashMap<String, Arc<Value>>>,
}

impl DocumentStore {
    /// Creates an empty store backed by `resolver`.
    pub fn new(resolver: impl DocumentResolver + 'static) -> Self {
        Self::from_boxed(Box::new(resolver))
    }

    /// Creates an empty store backed by an already boxed resolver.
    pub fn from_boxed(resolver: Box<dyn DocumentResolver>) -> Self {
        Self {
            resolver,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `document` under `uri` unless a document is already stored
    /// there, and returns the stored one.
    pub fn insert(&self, uri: &Url, document: Value) -> Arc<Value> {
        let key = document_key(uri);
        let mut documents = self.documents.write();
        Arc::clone(documents.entry(key).or_insert_with(|| Arc::new(document)))
    }

    /// Returns the document at `uri`, fetching it on first use.
    pub fn fetch(&self, uri: &Url) -> Result<Arc<Value>, ResolveError> {
        let key = document_key(uri);
        if let Some(document) = self.documents.read().get(&key) {
            trace!(uri = %key, "document cache hit");
            return Ok(Arc::clone(document));
        }

        debug!(uri = %key, "fetching schema document");
        let mut without_fragment = uri.clone();
        without_fragment.set_fragment(None);
        let document = self.resolver.resolve(&without_fragment)?;

        let mut documents = self.documents.write();
        Ok(Arc::clone(
            documents.entry(key).or_insert_with(|| Arc::new(document)),
        ))
    }

    /// Returns true if a document is stored under `uri`.
    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.read().contains_key(&document_key(uri))
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if no document is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(FileResolver::new())
    }
}

fn document_key(uri: &Url) -> String {
    let mut uri = uri.clone();
    uri.set_fragment(None);
    uri.to_string()
}
