//! Error types for the Lectern library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`LecternError`] enum. Every variant carries enough context to identify
//! the offending document and operation.
//!
//! # Examples
//!
//! ```
//! use lectern::error::{LecternError, Result};
//!
//! fn lookup(doc_id: &str) -> Result<()> {
//!     Err(LecternError::not_found(format!("document '{doc_id}'")))
//! }
//!
//! match lookup("missing") {
//!     Ok(_) => println!("found"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    /// Unknown document id or missing stored resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input: line ranges, chunk sizing, query strings, or
    /// unsupported strategy/scope literals.
    #[error("Validation error: {0}")]
    Validation(String),

    /// External document converter failure. A failed conversion never
    /// produces a partial document.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// External embedding provider failure. Ingestion that hits this leaves
    /// no partial index entries behind.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Internal invariant violation between the lexical and vector views of
    /// the same document. Should never occur while ingestion stays atomic.
    #[error("Index consistency error: {0}")]
    IndexConsistency(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors from the document registry.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors from vector index persistence.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic anyhow error.
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`LecternError`].
pub type Result<T> = std::result::Result<T, LecternError>;

impl LecternError {
    /// Create a new not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LecternError::NotFound(msg.into())
    }

    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        LecternError::Validation(msg.into())
    }

    /// Create a new conversion error.
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        LecternError::Conversion(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        LecternError::Embedding(msg.into())
    }

    /// Create a new index consistency error.
    pub fn index_consistency<S: Into<String>>(msg: S) -> Self {
        LecternError::IndexConsistency(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        LecternError::Serialization(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LecternError::not_found("document 'abc123'");
        assert_eq!(error.to_string(), "Not found: document 'abc123'");

        let error = LecternError::validation("empty query");
        assert_eq!(error.to_string(), "Validation error: empty query");

        let error = LecternError::embedding("provider unavailable");
        assert_eq!(error.to_string(), "Embedding error: provider unavailable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = LecternError::from(io_error);

        match error {
            LecternError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
