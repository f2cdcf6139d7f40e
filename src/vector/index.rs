//! Flat vector index with per-document persistence.

use std::fs;
use std::path::PathBuf;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, RankList, ScoredChunk};
use crate::error::{LecternError, Result};
use crate::vector::similarity::normalized_similarity;

/// One persisted chunk record: the chunk and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The chunk's embedding vector.
    pub embedding: Vec<f32>,
}

#[derive(Debug)]
struct Entry {
    record: VectorRecord,
    ord: u64,
}

/// Nearest-neighbor index over chunk embeddings.
///
/// Search scans all entries and scores them with normalized cosine
/// similarity. Every document's records are persisted to
/// `<dir>/<doc_id>.bin` so the index survives restart and a document can be
/// deleted by removing one file.
#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    entries: Vec<Entry>,
    next_ord: u64,
}

impl VectorIndex {
    /// Open an index persisting under `dir`, creating the directory if
    /// needed. No documents are loaded; call [`VectorIndex::load_document`]
    /// for each registered document.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(VectorIndex {
            dir,
            entries: Vec::new(),
            next_ord: 0,
        })
    }

    fn doc_path(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{doc_id}.bin"))
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
            .filter(|e| e.record.chunk.doc_id == doc_id)
            .count()
    }

    /// The persisted chunks of one document, in chunk order.
    pub fn document_chunks(&self, doc_id: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = self
            .entries
            .iter()
            .filter(|e| e.record.chunk.doc_id == doc_id)
            .map(|e| e.record.chunk.clone())
            .collect();
        chunks.sort_by_key(|c| c.chunk_index);
        chunks
    }

    /// Load one document's persisted records into memory.
    ///
    /// Returns the number of records loaded; a missing file loads zero.
    pub fn load_document(&mut self, doc_id: &str) -> Result<usize> {
        let path = self.doc_path(doc_id);
        if !path.exists() {
            return Ok(0);
        }
        let bytes = fs::read(&path)?;
        let records: Vec<VectorRecord> = bincode::deserialize(&bytes).map_err(|e| {
            LecternError::serialization(format!(
                "failed to decode vector file for document '{doc_id}': {e}"
            ))
        })?;
        let count = records.len();
        for record in records {
            let ord = self.next_ord;
            self.next_ord += 1;
            self.entries.push(Entry { record, ord });
        }
        Ok(count)
    }

    /// Replace one document's records, in memory and on disk.
    ///
    /// The on-disk file is written to a temporary path and renamed into
    /// place. If persisting fails, the in-memory state is restored to the
    /// previous records and the error is returned, so the index never holds
    /// a half-applied document.
    pub fn replace_document(
        &mut self,
        doc_id: &str,
        records: Vec<VectorRecord>,
    ) -> Result<Vec<VectorRecord>> {
        let mut old = Vec::new();
        self.entries.retain(|entry| {
            if entry.record.chunk.doc_id == doc_id {
                old.push(Entry {
                    record: entry.record.clone(),
                    ord: entry.ord,
                });
                false
            } else {
                true
            }
        });

        let first_new = self.entries.len();
        for record in &records {
            let ord = self.next_ord;
            self.next_ord += 1;
            self.entries.push(Entry {
                record: record.clone(),
                ord,
            });
        }

        if let Err(e) = self.persist(doc_id, &records) {
            self.entries.truncate(first_new);
            self.entries.extend(old);
            return Err(e);
        }

        Ok(old.into_iter().map(|e| e.record).collect())
    }

    /// Remove all records for a document, deleting its file.
    pub fn remove_document(&mut self, doc_id: &str) -> Result<Vec<VectorRecord>> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| {
            if entry.record.chunk.doc_id == doc_id {
                removed.push(entry.record.clone());
                false
            } else {
                true
            }
        });

        let path = self.doc_path(doc_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(removed)
    }

    fn persist(&self, doc_id: &str, records: &[VectorRecord]) -> Result<()> {
        let bytes = bincode::serialize(records).map_err(|e| {
            LecternError::serialization(format!(
                "failed to encode vector file for document '{doc_id}': {e}"
            ))
        })?;
        let path = self.doc_path(doc_id);
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Rank chunks by normalized cosine similarity to `query`, best first.
    ///
    /// Hits scoring below `threshold` are dropped before ranking is
    /// finalized. A dimension mismatch against any stored vector is an
    /// index consistency error.
    pub fn search(
        &self,
        query: &[f32],
        limit: usize,
        allowed: Option<&AHashSet<String>>,
        threshold: Option<f32>,
    ) -> Result<RankList> {
        if self.entries.is_empty() || limit == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: RankList = Vec::new();
        for entry in &self.entries {
            if let Some(allowed) = allowed {
                if !allowed.contains(&entry.record.chunk.doc_id) {
                    continue;
                }
            }
            let score =
                normalized_similarity(query, &entry.record.embedding).map_err(|e| {
                    LecternError::index_consistency(format!(
                        "document '{}' chunk {}: {e}",
                        entry.record.chunk.doc_id, entry.record.chunk.chunk_index
                    ))
                })?;
            if let Some(threshold) = threshold {
                if score < threshold {
                    continue;
                }
            }
            hits.push(ScoredChunk {
                chunk: entry.record.chunk.clone(),
                score,
                ord: entry.ord,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.ord.cmp(&b.ord))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}
