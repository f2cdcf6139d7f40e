//! Core data model: documents, chunks, and search hit types.
//!
//! A [`Document`] is the registry record for one ingested source. Its text
//! lives on disk as line-addressable markdown; the indexes operate on
//! [`Chunk`]s, contiguous segments of that text tagged with the 1-indexed,
//! inclusive line range they were cut from.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunker::ChunkSizing;

/// A table-of-contents entry extracted from a markdown heading.
///
/// `end_line` extends to the line before the next heading of the same or
/// higher level, or to the last line of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Section title.
    pub title: String,
    /// Heading level (1 for `#`, 2 for `##`, ...).
    pub level: usize,
    /// Starting line number (1-indexed).
    pub start_line: usize,
    /// Ending line number (1-indexed, inclusive).
    pub end_line: usize,
}

/// Full document record stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier (opaque, stable).
    pub id: String,
    /// Display name, usually the original filename.
    pub name: String,
    /// Total number of lines in the stored markdown.
    pub num_lines: usize,
    /// Parsed table of contents.
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
    /// Tags assigned to this document (case-sensitive).
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Chunk sizing used at ingestion, when a sized split produced the
    /// chunks. `None` means a custom splitter supplied the segments.
    #[serde(default)]
    pub sizing: Option<ChunkSizing>,
    /// Original file size in bytes (0 for text ingested directly).
    #[serde(default)]
    pub file_size: u64,
    /// Original file extension, including the leading dot.
    #[serde(default)]
    pub file_type: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (re-ingestion, tag changes).
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Format the table of contents as an indented, readable listing.
    pub fn format_toc(&self) -> String {
        if self.table_of_contents.is_empty() {
            return "No table of contents available".to_string();
        }

        let mut lines = Vec::with_capacity(self.table_of_contents.len());
        for entry in &self.table_of_contents {
            let indent = "  ".repeat(entry.level.saturating_sub(1));
            lines.push(format!(
                "{indent}- {} [lines {}-{}]",
                entry.title, entry.start_line, entry.end_line
            ));
        }
        lines.join("\n")
    }
}

/// A contiguous, line-addressable segment of a document: the unit of
/// indexing for both the lexical and vector indexes.
///
/// Chunks are immutable once created; re-ingesting a document replaces its
/// chunk set wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Parent document id.
    pub doc_id: String,
    /// Sequence position within the document.
    pub chunk_index: usize,
    /// Starting line number (1-indexed).
    pub start_line: usize,
    /// Ending line number (1-indexed, inclusive, `>= start_line`).
    pub end_line: usize,
    /// Raw text content.
    pub text: String,
}

impl Chunk {
    /// Identity key for this chunk within the corpus.
    pub fn key(&self) -> (&str, usize) {
        (&self.doc_id, self.chunk_index)
    }
}

/// One entry of a rank list: a chunk paired with a retrieval score.
///
/// `ord` is the chunk's ingestion ordinal inside the index that produced the
/// hit; it is the stable tie-breaker for equal scores and is never persisted.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Retrieval score (higher = more relevant).
    pub score: f32,
    /// Ingestion ordinal, for deterministic tie-breaking.
    pub ord: u64,
}

/// An ordered sequence of scored chunks produced by one retrieval strategy.
pub type RankList = Vec<ScoredChunk>;

/// Search result for document-level search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    /// Total lines in the document.
    pub num_lines: usize,
    /// Formatted table of contents.
    pub table_of_contents: String,
    /// Tags assigned to the document.
    pub tags: BTreeSet<String>,
    /// Relevance score (higher = more relevant; 0.0 for plain listings).
    pub score: f32,
    /// Representative snippet from the best-matching chunk.
    pub snippet: Option<String>,
}

/// Search result for chunk-level content search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSearchHit {
    /// Owning document id.
    pub doc_id: String,
    /// Owning document name; populated only for unaggregated queries that
    /// span multiple documents.
    pub doc_name: Option<String>,
    /// Starting line of the match (1-indexed).
    pub start_line: usize,
    /// Ending line of the match (1-indexed, inclusive).
    pub end_line: usize,
    /// Matching text content.
    pub text: String,
    /// Relevance score.
    pub score: f32,
}

/// Text excerpt returned by a line-range read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Excerpt {
    /// Document identifier.
    pub doc_id: String,
    /// First line of the excerpt (1-indexed, after clamping).
    pub start_line: usize,
    /// Last line of the excerpt (1-indexed, inclusive, after clamping).
    pub end_line: usize,
    /// The literal stored text lines, joined with newlines.
    pub text: String,
    /// Total lines in the document.
    pub total_lines: usize,
}
