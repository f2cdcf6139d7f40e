//! Embedding provider interface.
//!
//! The embedding model is an external collaborator: an opaque function from
//! text to a fixed-length vector. The indexes never compute embeddings
//! themselves; the engine calls the provider once per chunk set at ingestion
//! and once per query at search time.
//!
//! Providers must be deterministic for identical input within a session, or
//! repeated hybrid queries will not be reproducible. Failures surface as
//! [`crate::error::LecternError::Embedding`] and are never retried
//! internally, since a silent retry could double-bill a metered API.

use crate::error::Result;

/// An external text-embedding backend.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of document chunks, one vector per input text.
    ///
    /// All returned vectors must share one fixed dimension.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a search query.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text])?;
        Ok(vectors.pop().unwrap_or_default())
    }
}
