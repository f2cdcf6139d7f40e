//! # Lectern
//!
//! A knowledge-base layer with line-addressable documents and hybrid
//! retrieval.
//!
//! Lectern ingests documents, stores them as line-addressable markdown, and
//! indexes their chunks twice: in an in-memory BM25 index for keyword
//! matching and in a persistent cosine-similarity index over embeddings for
//! semantic matching. Queries run either index alone or both fused with
//! reciprocal rank fusion, and results come back at chunk or document
//! granularity with exact line-range provenance.
//!
//! ## Features
//!
//! - Separator-aware chunking with stable line ranges
//! - BM25 keyword search, rebuilt from stored text at startup
//! - Cosine-similarity vector search persisted per document
//! - Reciprocal rank fusion with deterministic tie-breaking
//! - Tag filters, document aggregation, and line-range reads
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lectern::config::LecternConfig;
//! use lectern::embedding::EmbeddingProvider;
//! use lectern::engine::{Lectern, SearchOptions};
//! use lectern::error::Result;
//!
//! fn example(embeddings: Arc<dyn EmbeddingProvider>) -> Result<()> {
//!     let engine = Lectern::open(LecternConfig::new("./kb"), embeddings)?;
//!     engine.ingest("notes", "notes.md", "# Notes\n\nsome text", None)?;
//!     let results = engine.search("some text", &SearchOptions::default())?;
//!     println!("{results:?}");
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod chunker;
pub mod config;
pub mod convert;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod hybrid;
pub mod lexical;
pub mod registry;
pub mod storage;
pub mod toc;
pub mod vector;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
