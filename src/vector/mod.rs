//! Vector (semantic) retrieval over document chunks.
//!
//! A flat nearest-neighbor index using cosine similarity, with scores
//! normalized to `[0, 1]`. Vectors and their chunk references persist in one
//! bincode file per document id, so removing a document deletes exactly its
//! vectors. Embeddings always come from the external provider; the index
//! never computes them.

pub mod index;
pub mod similarity;

pub use index::{VectorIndex, VectorRecord};
