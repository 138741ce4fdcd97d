//! Error types.
//!
//! Two channels: [`EngineError`]/[`ResolveError`] for failures that stop an
//! operation, and [`SchemaError`]/[`SchemaErrors`] for per-path failures that
//! are collected into reports.

mod engine_error;
mod schema_error;

pub use engine_error::{EngineError, ResolveError};
pub use schema_error::{SchemaError, SchemaErrors};
