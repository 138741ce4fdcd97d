//! Hard failures of the validation engine.
//!
//! These are raised only when validation cannot proceed at all: the root
//! schema is unusable, or a caller handed the context a URI it cannot even
//! interpret. Everything else ends up in a [`ValidationReport`](crate::ValidationReport).

use std::path::PathBuf;

use crate::pointer::PointerError;

/// Errors that abort an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The schema node is absent or JSON `null`.
    #[error("schema is null")]
    NullSchema,

    /// The schema node is not a JSON object.
    #[error("not a schema (not an object)")]
    NotASchema,

    /// The URI is neither absolute nor a bare fragment reference.
    #[error("invalid URI {0:?}: URI is not absolute and is not a JSON Pointer either")]
    InvalidUri(String),

    /// A fragment could not be parsed as a JSON Pointer.
    #[error(transparent)]
    InvalidPointer(#[from] PointerError),

    /// A document could not be fetched.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors produced while fetching a document by URI.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No resolver handles this URI scheme.
    #[error("cannot fetch {0}: unsupported URI scheme")]
    UnsupportedScheme(String),

    /// The URI does not map to a local file path.
    #[error("cannot fetch {0}: not a local file URI")]
    NotAFile(String),

    /// IO error reading a document.
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, Box<dyn std::error::Error + Send + Sync>),

    /// The fetched content is not valid JSON.
    #[error("parse error in {0}: {1}")]
    Parse(String, serde_json::Error),

    /// The resolver knows the scheme but has no such document.
    #[error("document not found: {0}")]
    NotFound(String),
}
