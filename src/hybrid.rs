//! Reciprocal Rank Fusion for combining ranked result lists.
//!
//! Hybrid retrieval runs the lexical and vector indexes independently and
//! merges their rank lists here. RRF combines positions, not raw scores, so
//! the two indexes' incomparable score scales never need normalizing.

use ahash::AHashMap;

use crate::document::{RankList, ScoredChunk};

/// Default dampening constant.
pub const DEFAULT_RRF_K: u32 = 60;

#[derive(Debug)]
struct Fused {
    chunk: crate::document::Chunk,
    score: f32,
    best_rank: usize,
    ord: u64,
}

/// Merge ranked lists with Reciprocal Rank Fusion.
///
/// A chunk's fused score is the sum over the lists containing it of
/// `1 / (k + rank)`, with `rank` its 1-indexed position in that list; a
/// chunk absent from a list contributes nothing for it. `k` dampens the
/// influence of low ranks.
///
/// Output is sorted by fused score descending. Ties break by the chunk's
/// best (lowest) rank across the input lists, then by ingestion order, so
/// fusion is deterministic for identical inputs.
pub fn reciprocal_rank_fusion(lists: &[RankList], k: u32, limit: usize) -> RankList {
    let mut fused: AHashMap<(String, usize), Fused> = AHashMap::new();
    let k = k as f32;

    for list in lists {
        for (rank, hit) in list.iter().enumerate().map(|(i, h)| (i + 1, h)) {
            let contribution = 1.0 / (k + rank as f32);
            let key = (hit.chunk.doc_id.clone(), hit.chunk.chunk_index);
            match fused.get_mut(&key) {
                Some(entry) => {
                    entry.score += contribution;
                    entry.best_rank = entry.best_rank.min(rank);
                    entry.ord = entry.ord.min(hit.ord);
                }
                None => {
                    fused.insert(
                        key,
                        Fused {
                            chunk: hit.chunk.clone(),
                            score: contribution,
                            best_rank: rank,
                            ord: hit.ord,
                        },
                    );
                }
            }
        }
    }

    let mut merged: Vec<Fused> = fused.into_values().collect();
    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.best_rank.cmp(&b.best_rank))
            .then(a.ord.cmp(&b.ord))
    });
    merged.truncate(limit);

    merged
        .into_iter()
        .map(|f| ScoredChunk {
            chunk: f.chunk,
            score: f.score,
            ord: f.ord,
        })
        .collect()
}
