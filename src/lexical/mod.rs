//! Lexical (keyword) retrieval over document chunks.
//!
//! An in-memory inverted index with BM25 scoring. The index holds no
//! persistent state of its own: it is fully rebuildable from stored chunk
//! text and is reconstructed at startup by re-tokenizing every registered
//! document.

pub mod index;

pub use index::{Bm25Params, LexicalIndex};
