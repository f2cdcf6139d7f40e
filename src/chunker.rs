//! Separator-aware text chunking with line-range provenance.
//!
//! Splitting prefers earlier-listed separators (heading boundaries, then
//! blank lines, then single newlines, then spaces) so chunks avoid cutting
//! mid-structure, and falls back to hard splits only for fragments no
//! separator can reduce. Every chunk is mapped back to a 1-indexed,
//! inclusive line range in the source text, snapping outward to whole lines
//! when a segment starts or ends mid-line.
//!
//! Sizes are measured in bytes of UTF-8 text; splits always land on
//! character boundaries.

use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::error::{LecternError, Result};

/// Default separator preference list for markdown-like text.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n# ", "\n## ", "\n### ", "\n\n", "\n", " "];

/// Chunk size and overlap, in bytes of UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSizing {
    /// Maximum chunk length.
    pub chunk_size: usize,
    /// Trailing bytes of chunk *i* repeated at the start of chunk *i + 1*.
    pub chunk_overlap: usize,
}

impl ChunkSizing {
    /// The fixed fallback sizing.
    pub const DEFAULT: ChunkSizing = ChunkSizing {
        chunk_size: 1500,
        chunk_overlap: 200,
    };

    /// Create a new sizing.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        ChunkSizing {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Check that the sizing is usable: a positive chunk size and an overlap
    /// strictly smaller than it.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(LecternError::validation("chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(LecternError::validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkSizing {
    fn default() -> Self {
        ChunkSizing::DEFAULT
    }
}

/// A caller-supplied splitting strategy.
///
/// Implementations return the segment texts in document order; every segment
/// must be a substring of the input so it can be mapped back to line ranges.
pub trait TextSplit: Send + Sync {
    /// Split `text` into segment strings.
    fn split(&self, text: &str) -> Vec<String>;
}

/// The splitting plan one ingestion call will use.
pub enum SplitPlan<'a> {
    /// Separator-aware sized splitting.
    Sized(ChunkSizing),
    /// Caller-supplied splitter.
    Custom(&'a dyn TextSplit),
}

/// Automatic sizing from the total character count of the document.
pub fn auto_sizing(total_len: usize) -> ChunkSizing {
    if total_len < 5_000 {
        ChunkSizing::new(500, 50)
    } else if total_len <= 50_000 {
        ChunkSizing::new(1500, 200)
    } else {
        ChunkSizing::new(3000, 400)
    }
}

/// Resolve which splitting tier applies to one call.
///
/// Precedence: explicit per-call sizing, then a caller-supplied splitter,
/// then automatic sizing (when enabled), then [`ChunkSizing::DEFAULT`].
/// Exactly one tier applies; lower tiers are never consulted once a higher
/// tier is present.
pub fn resolve_split_plan<'a>(
    explicit: Option<ChunkSizing>,
    splitter: Option<&'a dyn TextSplit>,
    auto_chunk: bool,
    total_len: usize,
) -> SplitPlan<'a> {
    if let Some(sizing) = explicit {
        return SplitPlan::Sized(sizing);
    }
    if let Some(splitter) = splitter {
        return SplitPlan::Custom(splitter);
    }
    if auto_chunk {
        return SplitPlan::Sized(auto_sizing(total_len));
    }
    SplitPlan::Sized(ChunkSizing::DEFAULT)
}

/// Split `text` into overlapping chunks tagged with line ranges, using the
/// default separator preferences.
///
/// Empty text yields an empty sequence. Text no longer than the chunk size
/// yields exactly one chunk spanning the whole document.
pub fn chunk_text(text: &str, doc_id: &str, sizing: ChunkSizing) -> Result<Vec<Chunk>> {
    chunk_text_with(text, doc_id, sizing, DEFAULT_SEPARATORS)
}

/// Split `text` with an explicit separator preference list.
pub fn chunk_text_with(
    text: &str,
    doc_id: &str,
    sizing: ChunkSizing,
    separators: &[&str],
) -> Result<Vec<Chunk>> {
    sizing.validate()?;
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut spans = Vec::new();
    split_recursive(
        text,
        0,
        text.len(),
        separators,
        sizing.chunk_size,
        &mut spans,
    );

    let total_lines = count_lines(text);
    let last = spans.len() - 1;
    let mut chunks = Vec::with_capacity(spans.len());
    let mut prev_start = 0usize;

    for (i, &(start, end)) in spans.iter().enumerate() {
        // Pull in trailing context from the previous chunk, never reaching
        // past its own start.
        let mut with_overlap = start;
        if i > 0 && sizing.chunk_overlap > 0 {
            with_overlap = start.saturating_sub(sizing.chunk_overlap).max(prev_start);
            while !text.is_char_boundary(with_overlap) {
                with_overlap -= 1;
            }
        }

        let end_line = if i == last {
            total_lines
        } else {
            line_at(text, end - 1)
        };

        chunks.push(Chunk {
            doc_id: doc_id.to_string(),
            chunk_index: i,
            start_line: line_at(text, with_overlap),
            end_line,
            text: text[with_overlap..end].to_string(),
        });
        prev_start = start;
    }

    Ok(chunks)
}

/// Split `text` with a caller-supplied splitter, mapping each segment back
/// to its line range in the source.
///
/// Segments that are not substrings of the input cannot be located and are
/// rejected with a validation error.
pub fn chunk_with_splitter(
    text: &str,
    doc_id: &str,
    splitter: &dyn TextSplit,
) -> Result<Vec<Chunk>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let total_lines = count_lines(text);
    let mut chunks = Vec::new();

    for segment in splitter.split(text) {
        if segment.is_empty() {
            continue;
        }
        let start = text.find(&segment).ok_or_else(|| {
            LecternError::validation("custom splitter returned a segment not found in the source text")
        })?;
        let end = start + segment.len();
        let end_line = if end == text.len() {
            total_lines
        } else {
            line_at(text, end - 1)
        };
        chunks.push(Chunk {
            doc_id: doc_id.to_string(),
            chunk_index: chunks.len(),
            start_line: line_at(text, start),
            end_line,
            text: segment,
        });
    }

    Ok(chunks)
}

/// Number of lines in `text`, counting a trailing empty line after a final
/// newline.
pub fn count_lines(text: &str) -> usize {
    text.as_bytes().iter().filter(|b| **b == b'\n').count() + 1
}

/// 1-indexed line containing the byte at `pos`.
fn line_at(text: &str, pos: usize) -> usize {
    text.as_bytes()[..pos].iter().filter(|b| **b == b'\n').count() + 1
}

/// Recursively cut `[start, end)` into spans no longer than `chunk_size`,
/// preferring the earliest separator that produces an interior split point.
fn split_recursive(
    text: &str,
    start: usize,
    end: usize,
    separators: &[&str],
    chunk_size: usize,
    out: &mut Vec<(usize, usize)>,
) {
    if end - start <= chunk_size {
        out.push((start, end));
        return;
    }

    for (i, sep) in separators.iter().enumerate() {
        let points = interior_split_points(text, start, end, sep);
        if points.is_empty() {
            continue;
        }
        let rest = &separators[i + 1..];

        let mut bounds = Vec::with_capacity(points.len() + 2);
        bounds.push(start);
        bounds.extend(points);
        bounds.push(end);

        // Greedily pack adjacent pieces into segments within chunk_size;
        // oversize pieces recurse with the remaining separators.
        let mut seg_start = start;
        for pair in bounds.windows(2) {
            let (piece_start, piece_end) = (pair[0], pair[1]);
            if piece_end - seg_start > chunk_size {
                if seg_start < piece_start {
                    out.push((seg_start, piece_start));
                    seg_start = piece_start;
                }
                if piece_end - piece_start > chunk_size {
                    split_recursive(text, piece_start, piece_end, rest, chunk_size, out);
                    seg_start = piece_end;
                }
            }
        }
        if seg_start < end {
            out.push((seg_start, end));
        }
        return;
    }

    hard_split(text, start, end, chunk_size, out);
}

/// Split points strictly inside `[start, end)` for one separator.
///
/// Whitespace separators stay attached to the preceding piece; heading
/// separators split right after the newline so the heading marker starts
/// the next piece.
fn interior_split_points(text: &str, start: usize, end: usize, sep: &str) -> Vec<usize> {
    let keep = if sep.trim_start().is_empty() {
        sep.len()
    } else {
        1
    };
    text[start..end]
        .match_indices(sep)
        .map(|(at, _)| start + at + keep)
        .filter(|p| *p > start && *p < end)
        .collect()
}

/// Last-resort splitting at fixed byte steps, snapped to char boundaries.
fn hard_split(
    text: &str,
    start: usize,
    end: usize,
    chunk_size: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let mut at = start;
    while at < end {
        let mut next = (at + chunk_size).min(end);
        while !text.is_char_boundary(next) {
            next += 1;
        }
        out.push((at, next));
        at = next;
    }
}
