//! BM25 inverted index over chunk text.

use ahash::AHashMap;

use crate::analysis::WordTokenizer;
use crate::document::{Chunk, RankList, ScoredChunk};

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f32,
    /// Length normalization.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug)]
struct Entry {
    chunk: Chunk,
    tokens: Vec<String>,
    ord: u64,
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    entry: usize,
    tf: u32,
}

/// In-memory BM25 index over document chunks.
///
/// Corpus statistics (average chunk length, per-term document frequency)
/// are recomputed whenever the corpus changes. Ranking ties break by
/// ingestion order.
#[derive(Debug)]
pub struct LexicalIndex {
    tokenizer: WordTokenizer,
    params: Bm25Params,
    entries: Vec<Entry>,
    postings: AHashMap<String, Vec<Posting>>,
    total_tokens: usize,
    next_ord: u64,
}

impl LexicalIndex {
    /// Create an empty index with default BM25 parameters.
    pub fn new() -> Self {
        Self::with_params(Bm25Params::default())
    }

    /// Create an empty index with explicit BM25 parameters.
    pub fn with_params(params: Bm25Params) -> Self {
        LexicalIndex {
            tokenizer: WordTokenizer::new(),
            params,
            entries: Vec::new(),
            postings: AHashMap::new(),
            total_tokens: 0,
            next_ord: 0,
        }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indexed chunks belonging to one document.
    pub fn doc_chunk_count(&self, doc_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.chunk.doc_id == doc_id)
            .count()
    }

    /// Add chunks to the index and recompute corpus statistics.
    pub fn add_chunks(&mut self, chunks: &[Chunk]) {
        for chunk in chunks {
            let tokens = self.tokenizer.tokenize(&chunk.text);
            let ord = self.next_ord;
            self.next_ord += 1;
            self.entries.push(Entry {
                chunk: chunk.clone(),
                tokens,
                ord,
            });
        }
        self.rebuild();
    }

    /// Remove all chunks for a document, returning them in chunk order.
    pub fn remove_document(&mut self, doc_id: &str) -> Vec<Chunk> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| {
            if entry.chunk.doc_id == doc_id {
                removed.push(entry.chunk.clone());
                false
            } else {
                true
            }
        });
        self.rebuild();
        removed
    }

    fn rebuild(&mut self) {
        self.postings.clear();
        self.total_tokens = 0;
        for (idx, entry) in self.entries.iter().enumerate() {
            self.total_tokens += entry.tokens.len();
            let mut counts: AHashMap<&str, u32> = AHashMap::new();
            for token in &entry.tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, tf) in counts {
                self.postings
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting { entry: idx, tf });
            }
        }
    }

    /// Rank chunks against `query`, best first.
    ///
    /// Only chunks containing at least one query term are scored. When
    /// `allowed` is given, hits outside the id set are skipped; corpus
    /// statistics stay global either way.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        allowed: Option<&ahash::AHashSet<String>>,
    ) -> RankList {
        if self.entries.is_empty() || limit == 0 {
            return Vec::new();
        }

        let query_tokens = self.tokenizer.tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let n = self.entries.len() as f32;
        let avg_len = self.total_tokens as f32 / n;
        let mut scores: AHashMap<usize, f32> = AHashMap::new();

        for term in &query_tokens {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let df = postings.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            for posting in postings {
                let entry = &self.entries[posting.entry];
                let tf = posting.tf as f32;
                let doc_len = entry.tokens.len() as f32;
                let tf_component = (tf * (self.params.k1 + 1.0))
                    / (tf
                        + self.params.k1
                            * (1.0 - self.params.b + self.params.b * (doc_len / avg_len)));
                *scores.entry(posting.entry).or_insert(0.0) += idf * tf_component;
            }
        }

        let mut hits: RankList = scores
            .into_iter()
            .filter_map(|(idx, score)| {
                let entry = &self.entries[idx];
                if let Some(allowed) = allowed {
                    if !allowed.contains(&entry.chunk.doc_id) {
                        return None;
                    }
                }
                Some(ScoredChunk {
                    chunk: entry.chunk.clone(),
                    score,
                    ord: entry.ord,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.ord.cmp(&b.ord))
        });
        hits.truncate(limit);
        hits
    }
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new()
    }
}
