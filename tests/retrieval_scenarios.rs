//! End-to-end retrieval scenarios over a real on-disk knowledge base.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use lectern::chunker::ChunkSizing;
use lectern::config::LecternConfig;
use lectern::embedding::EmbeddingProvider;
use lectern::engine::{Lectern, Scope, SearchOptions, Strategy};
use lectern::error::{LecternError, Result};

/// Deterministic hashed bag-of-words embedder.
struct BagOfWords;

const DIM: usize = 64;

fn bucket(word: &str) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in word.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    (hash % DIM as u64) as usize
}

fn embed_bow(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for word in text.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if !word.is_empty() {
            vector[bucket(&word)] += 1.0;
        }
    }
    vector
}

impl EmbeddingProvider for BagOfWords {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_bow(t)).collect())
    }
}

/// Topic embedder: three axes counting section-specific keywords, so
/// semantically related text lands near itself.
struct TopicEmbedder;

impl EmbeddingProvider for TopicEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let count = |needle: &str| lower.matches(needle).count() as f32;
                vec![
                    count("alpha"),
                    count("beta") + count("zygomorphic"),
                    count("gamma"),
                ]
            })
            .collect())
    }
}

/// Every chunk and every query embed to the same vector.
struct AllSame;

impl EmbeddingProvider for AllSame {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Chunks and queries embed to orthogonal vectors: every vector hit scores
/// exactly 0.5 after normalization.
struct Orthogonal;

impl EmbeddingProvider for Orthogonal {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
    }

    fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

fn open(dir: &Path, embeddings: Arc<dyn EmbeddingProvider>) -> Lectern {
    Lectern::open(LecternConfig::new(dir), embeddings).unwrap()
}

fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|t| t.to_string()).collect()
}

/// A three-section markdown document with headings at lines 1, 20, and 45.
fn three_section_doc() -> String {
    let mut lines = Vec::new();
    lines.push("# Alpha Section".to_string());
    for _ in 0..18 {
        lines.push("alpha prose about the opening topic of this guide".to_string());
    }
    // Line 20.
    lines.push("## Beta Section".to_string());
    lines.push("beta prose mentioning the zygomorphic flower structure".to_string());
    for _ in 0..23 {
        lines.push("beta prose continuing the middle part of the guide".to_string());
    }
    // Line 45.
    lines.push("## Gamma Section".to_string());
    for _ in 0..15 {
        lines.push("gamma prose wrapping up the final part of the guide".to_string());
    }
    lines.join("\n")
}

#[test]
fn three_section_document_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(TopicEmbedder));

    let text = three_section_doc();
    // Size a chunk to roughly one section.
    let count = engine
        .ingest("guide", "guide.md", &text, Some(ChunkSizing::new(1100, 0)))
        .unwrap();
    assert!(count >= 3, "expected one chunk per section, got {count}");

    // A term unique to section two, under each strategy.
    for strategy in [Strategy::Bm25, Strategy::Vector, Strategy::Hybrid] {
        let hits = engine
            .search_within("guide", "zygomorphic", 3, Some(strategy))
            .unwrap();
        let found = hits
            .iter()
            .any(|hit| hit.start_line >= 20 && hit.start_line < 45);
        assert!(
            found,
            "{strategy} should surface the section-two chunk in the top 3: {hits:?}"
        );
    }

    // BM25 puts it first, with section-two provenance.
    let hits = engine
        .search_within("guide", "zygomorphic", 3, Some(Strategy::Bm25))
        .unwrap();
    assert!(hits[0].start_line >= 20 && hits[0].start_line < 45);
    assert!(hits[0].end_line < 45);
    assert!(hits[0].text.contains("zygomorphic"));
}

#[test]
fn read_returns_verbatim_lines_and_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    let text: String = (1..=10_000)
        .map(|i| format!("content of line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    engine.ingest("big", "big.md", &text, None).unwrap();

    let excerpt = engine.read("big", 1, 100).unwrap();
    assert_eq!(excerpt.start_line, 1);
    assert_eq!(excerpt.end_line, 100);
    let lines: Vec<&str> = excerpt.text.split('\n').collect();
    assert_eq!(lines.len(), 100);
    assert_eq!(lines[0], "content of line 1");
    assert_eq!(lines[99], "content of line 100");

    let excerpt = engine.read("big", 9990, 10_050).unwrap();
    assert_eq!(excerpt.start_line, 9990);
    assert_eq!(excerpt.end_line, 10_000);
    assert_eq!(excerpt.total_lines, 10_000);
    assert!(excerpt.text.ends_with("content of line 10000"));
}

#[test]
fn reingestion_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    let text = three_section_doc();
    let sizing = Some(ChunkSizing::new(800, 100));
    let first_count = engine.ingest("guide", "guide.md", &text, sizing).unwrap();
    let first_hits = engine
        .search_within("guide", "zygomorphic flower", 10, Some(Strategy::Hybrid))
        .unwrap();

    let second_count = engine.ingest("guide", "guide.md", &text, sizing).unwrap();
    let second_hits = engine
        .search_within("guide", "zygomorphic flower", 10, Some(Strategy::Hybrid))
        .unwrap();

    assert_eq!(first_count, second_count);
    assert_eq!(engine.document_count(), 1);
    assert_eq!(first_hits.len(), second_hits.len());
    for (a, b) in first_hits.iter().zip(second_hits.iter()) {
        assert_eq!(a.start_line, b.start_line);
        assert_eq!(a.end_line, b.end_line);
        assert_eq!(a.text, b.text);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[test]
fn aggregation_is_one_hit_per_document_at_max_score() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    let sizing = Some(ChunkSizing::new(60, 0));
    engine
        .ingest(
            "a",
            "a.md",
            "shared topic words here\n\nshared topic again in a second chunk\n\nand shared topic once more",
            sizing,
        )
        .unwrap();
    engine
        .ingest(
            "b",
            "b.md",
            "shared topic in another document\n\nwith more shared topic text",
            sizing,
        )
        .unwrap();

    let unaggregated = engine
        .search(
            "shared topic",
            &SearchOptions {
                top_k: 30,
                aggregate: false,
                strategy: Some(Strategy::Hybrid),
                ..Default::default()
            },
        )
        .unwrap()
        .into_chunks()
        .unwrap();
    assert!(unaggregated.len() > 2);
    // Unaggregated multi-document hits carry the owning document's name.
    assert!(unaggregated.iter().all(|h| h.doc_name.is_some()));

    let aggregated = engine
        .search(
            "shared topic",
            &SearchOptions {
                top_k: 10,
                aggregate: true,
                strategy: Some(Strategy::Hybrid),
                ..Default::default()
            },
        )
        .unwrap()
        .into_documents()
        .unwrap();

    assert_eq!(aggregated.len(), 2);
    let mut seen = BTreeSet::new();
    for hit in &aggregated {
        assert!(seen.insert(hit.id.clone()), "duplicate document {}", hit.id);
        let best_chunk_score = unaggregated
            .iter()
            .filter(|c| c.doc_id == hit.id)
            .map(|c| c.score)
            .fold(f32::MIN, f32::max);
        assert!(
            (hit.score - best_chunk_score).abs() < 1e-6,
            "aggregated score must be the max chunk score"
        );
        assert!(hit.snippet.is_some());
    }
}

#[test]
fn tag_filter_uses_or_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    engine
        .ingest("d1", "d1.md", "common searchable text one", None)
        .unwrap();
    engine
        .ingest("d2", "d2.md", "common searchable text two", None)
        .unwrap();
    engine
        .ingest("d3", "d3.md", "common searchable text three", None)
        .unwrap();
    engine.tag_document("d1", &tags(&["a", "c"])).unwrap();
    engine.tag_document("d2", &tags(&["c"])).unwrap();
    engine.tag_document("d3", &tags(&["b"])).unwrap();

    let hits = engine
        .search(
            "common searchable",
            &SearchOptions {
                tags: Some(tags(&["a", "b"])),
                strategy: Some(Strategy::Bm25),
                ..Default::default()
            },
        )
        .unwrap()
        .into_documents()
        .unwrap();

    let ids: BTreeSet<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["d1", "d3"].into_iter().collect());
    assert_eq!(hits.len(), 2, "documents match at most once");

    // A filter matching nothing returns an empty result set, not an error.
    let hits = engine
        .search(
            "common",
            &SearchOptions {
                tags: Some(tags(&["nope"])),
                ..Default::default()
            },
        )
        .unwrap()
        .into_documents()
        .unwrap();
    assert!(hits.is_empty());

    assert_eq!(engine.list_tags(), tags(&["a", "b", "c"]));

    engine.untag_document("d1", &tags(&["a"])).unwrap();
    assert_eq!(engine.document("d1").unwrap().tags, tags(&["c"]));
}

#[test]
fn fused_score_for_rank_one_in_both_lists() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(AllSame));

    engine
        .ingest("d", "d.md", "a single chunk about melons", None)
        .unwrap();

    let hits = engine
        .search_within("d", "melons", 5, Some(Strategy::Hybrid))
        .unwrap();
    assert_eq!(hits.len(), 1);
    // Rank 1 in the lexical list and rank 1 in the vector list.
    assert!((hits[0].score - 2.0 / 61.0).abs() < 1e-6);
}

#[test]
fn similarity_threshold_silences_vector_contributions() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LecternConfig::new(dir.path());
    config.similarity_threshold = Some(0.9);
    let engine = Lectern::open(config, Arc::new(Orthogonal)).unwrap();

    engine
        .ingest("d", "d.md", "a single chunk about melons", None)
        .unwrap();

    // Every vector hit scores 0.5, below the threshold.
    let hits = engine
        .search_within("d", "melons", 5, Some(Strategy::Vector))
        .unwrap();
    assert!(hits.is_empty());

    // Under hybrid the chunk keeps only its lexical contribution.
    let hits = engine
        .search_within("d", "melons", 5, Some(Strategy::Hybrid))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 1.0 / 61.0).abs() < 1e-6);
}

#[test]
fn vector_hits_survive_without_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(Orthogonal));

    engine
        .ingest("d", "d.md", "a single chunk about melons", None)
        .unwrap();

    let hits = engine
        .search_within("d", "melons", 5, Some(Strategy::Vector))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 0.5).abs() < 1e-6);
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let text = three_section_doc();

    {
        let engine = open(dir.path(), Arc::new(TopicEmbedder));
        engine
            .ingest("guide", "guide.md", &text, Some(ChunkSizing::new(1100, 0)))
            .unwrap();
        engine.tag_document("guide", &tags(&["botany"])).unwrap();
    }

    // Reopen: registry and vectors load from disk, the lexical index is
    // rebuilt from stored text.
    let engine = open(dir.path(), Arc::new(TopicEmbedder));
    assert_eq!(engine.document_count(), 1);
    assert_eq!(engine.document("guide").unwrap().tags, tags(&["botany"]));

    for strategy in [Strategy::Bm25, Strategy::Vector, Strategy::Hybrid] {
        let hits = engine
            .search_within("guide", "zygomorphic", 3, Some(strategy))
            .unwrap();
        assert!(
            hits.iter().any(|h| h.start_line >= 20 && h.start_line < 45),
            "{strategy} should keep working after restart"
        );
    }
}

#[test]
fn remove_erases_document_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    engine
        .ingest("d1", "d1.md", "unique pangolin text", None)
        .unwrap();
    engine
        .ingest("d2", "d2.md", "unique aardvark text", None)
        .unwrap();
    engine.remove("d1").unwrap();

    assert_eq!(engine.document_count(), 1);
    assert!(matches!(
        engine.search_within("d1", "pangolin", 5, None).unwrap_err(),
        LecternError::NotFound(_)
    ));
    let hits = engine
        .search(
            "unique pangolin",
            &SearchOptions {
                strategy: Some(Strategy::Bm25),
                aggregate: false,
                ..Default::default()
            },
        )
        .unwrap()
        .into_chunks()
        .unwrap();
    assert!(hits.iter().all(|h| h.doc_id != "d1"));

    // The removed document stays gone after a restart.
    drop(engine);
    let engine = open(dir.path(), Arc::new(BagOfWords));
    assert_eq!(engine.document_count(), 1);
    assert!(engine.document("d2").is_ok());
}

#[test]
fn load_document_converts_and_indexes() {
    let kb_dir = tempfile::tempdir().unwrap();
    let src_dir = tempfile::tempdir().unwrap();
    let engine = open(kb_dir.path(), Arc::new(BagOfWords));

    let path = src_dir.path().join("notes.md");
    std::fs::write(&path, "# Notes\n\nimportant okapi facts\n").unwrap();

    let doc_id = engine.load_document(&path, Some(tags(&["zoo"]))).unwrap();
    let doc = engine.document(&doc_id).unwrap();
    assert_eq!(doc.name, "notes.md");
    assert_eq!(doc.file_type, ".md");
    assert_eq!(doc.tags, tags(&["zoo"]));
    assert_eq!(doc.table_of_contents.len(), 1);

    let hits = engine
        .search_within(&doc_id, "okapi", 5, Some(Strategy::Bm25))
        .unwrap();
    assert_eq!(hits.len(), 1);

    // Unsupported extensions are a conversion error.
    let bad = src_dir.path().join("scan.pdf");
    std::fs::write(&bad, b"%PDF-").unwrap();
    assert!(matches!(
        engine.load_document(&bad, None).unwrap_err(),
        LecternError::Conversion(_)
    ));
}

#[test]
fn empty_corpus_searches_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path(), Arc::new(BagOfWords));

    let hits = engine
        .search("anything", &SearchOptions::default())
        .unwrap()
        .into_documents()
        .unwrap();
    assert!(hits.is_empty());

    let hits = engine
        .search(
            "anything",
            &SearchOptions {
                scope: Scope::Names,
                ..Default::default()
            },
        )
        .unwrap()
        .into_documents()
        .unwrap();
    assert!(hits.is_empty());
}
