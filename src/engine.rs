//! The retrieval orchestrator.
//!
//! [`Lectern`] is the facade over the document registry and the two
//! retrieval indexes. It owns the full request pipeline: validate inputs,
//! resolve the target document set (all documents or a tag filter with OR
//! semantics), dispatch to the configured strategy, fuse, filter, aggregate,
//! and truncate.
//!
//! Ingestion is a destructive full replace of one document's chunks in both
//! indexes. Everything fallible (chunking, embedding) happens before any
//! index mutation, and the two-index update runs under both write locks so
//! queries never observe one index updated and the other not.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashSet;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunker::{self, ChunkSizing, SplitPlan, TextSplit};
use crate::config::LecternConfig;
use crate::convert::Converter;
use crate::document::{ContentSearchHit, Document, Excerpt, RankList, SearchHit};
use crate::embedding::EmbeddingProvider;
use crate::error::{LecternError, Result};
use crate::hybrid::reciprocal_rank_fusion;
use crate::lexical::LexicalIndex;
use crate::registry::DocumentRegistry;
use crate::storage::{StorageLayout, validate_doc_id};
use crate::toc::extract_toc;
use crate::vector::{VectorIndex, VectorRecord};

/// Which retrieval mechanism a query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lexical index only.
    Bm25,
    /// Vector index only.
    Vector,
    /// Both indexes, fused with reciprocal rank fusion.
    Hybrid,
}

impl FromStr for Strategy {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bm25" => Ok(Strategy::Bm25),
            "vector" => Ok(Strategy::Vector),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(LecternError::validation(format!(
                "unsupported strategy '{other}' (expected bm25, vector, or hybrid)"
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Bm25 => "bm25",
            Strategy::Vector => "vector",
            Strategy::Hybrid => "hybrid",
        })
    }
}

/// Whether a query matches document names or document contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Match display names only; no chunk involvement.
    Names,
    /// Search chunk contents.
    Contents,
}

impl FromStr for Scope {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "names" => Ok(Scope::Names),
            "contents" => Ok(Scope::Contents),
            other => Err(LecternError::validation(format!(
                "unsupported scope '{other}' (expected names or contents)"
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Names => "names",
            Scope::Contents => "contents",
        })
    }
}

/// Options for a corpus-wide search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results after filtering and aggregation.
    pub top_k: usize,
    /// What the query matches against.
    pub scope: Scope,
    /// Retrieval strategy; `None` uses the configured default.
    pub strategy: Option<Strategy>,
    /// Restrict to documents carrying at least one of these tags.
    pub tags: Option<BTreeSet<String>>,
    /// Collapse chunk hits into one hit per document.
    pub aggregate: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            top_k: 10,
            scope: Scope::Contents,
            strategy: None,
            tags: None,
            aggregate: true,
        }
    }
}

/// Results of a corpus-wide search, shaped by scope and aggregation.
#[derive(Debug, Clone)]
pub enum SearchResults {
    /// Document-level hits (name scope, or aggregated content scope).
    Documents(Vec<SearchHit>),
    /// Chunk-level hits (unaggregated content scope).
    Chunks(Vec<ContentSearchHit>),
}

impl SearchResults {
    /// The document-level hits, if this is a document result set.
    pub fn into_documents(self) -> Option<Vec<SearchHit>> {
        match self {
            SearchResults::Documents(hits) => Some(hits),
            SearchResults::Chunks(_) => None,
        }
    }

    /// The chunk-level hits, if this is a chunk result set.
    pub fn into_chunks(self) -> Option<Vec<ContentSearchHit>> {
        match self {
            SearchResults::Documents(_) => None,
            SearchResults::Chunks(hits) => Some(hits),
        }
    }
}

/// Builder for [`Lectern`], collecting the external collaborators before
/// the indexes are loaded.
pub struct LecternBuilder {
    config: LecternConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
    converter: Converter,
    splitter: Option<Arc<dyn TextSplit>>,
}

impl LecternBuilder {
    /// Start a builder with the mandatory collaborators.
    pub fn new(config: LecternConfig, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        LecternBuilder {
            config,
            embeddings,
            converter: Converter::default(),
            splitter: None,
        }
    }

    /// Use a specific document converter backend.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Use a caller-supplied splitting strategy for ingestion.
    pub fn splitter(mut self, splitter: Arc<dyn TextSplit>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Open the knowledge base: load the registry and vector files, rebuild
    /// the lexical index from stored text.
    pub fn open(self) -> Result<Lectern> {
        self.config.validate()?;
        let layout = StorageLayout::new(&self.config.storage_dir)?;
        let registry = DocumentRegistry::open(layout.clone())?;
        let mut vector = VectorIndex::open(layout.vectors_dir()?)?;
        let mut lexical = LexicalIndex::new();

        for doc in registry.list() {
            let loaded = vector.load_document(&doc.id)?;
            let chunks = match doc.sizing {
                Some(sizing) => {
                    let text = layout.read_content(&doc.id)?;
                    chunker::chunk_text(&text, &doc.id, sizing)?
                }
                None => match &self.splitter {
                    Some(splitter) => {
                        let text = layout.read_content(&doc.id)?;
                        chunker::chunk_with_splitter(&text, &doc.id, splitter.as_ref())?
                    }
                    // Chunks came from a splitter that is no longer
                    // available; fall back to the persisted chunk set.
                    None => vector.document_chunks(&doc.id),
                },
            };
            if loaded > 0 && chunks.len() != loaded {
                return Err(LecternError::index_consistency(format!(
                    "document '{}' rebuilds to {} lexical chunks but has {} vector records",
                    doc.id,
                    chunks.len(),
                    loaded
                )));
            }
            if loaded == 0 && !chunks.is_empty() {
                tracing::warn!(
                    "document '{}' has no vector records; vector hits will be absent",
                    doc.id
                );
            }
            lexical.add_chunks(&chunks);
        }

        tracing::info!(
            "opened knowledge base with {} documents, {} chunks",
            registry.len(),
            lexical.len()
        );

        Ok(Lectern {
            config: self.config,
            layout,
            registry: RwLock::new(registry),
            lexical: RwLock::new(lexical),
            vector: RwLock::new(vector),
            embeddings: self.embeddings,
            converter: self.converter,
            splitter: self.splitter,
        })
    }
}

/// The knowledge base: document registry plus dual retrieval indexes.
pub struct Lectern {
    config: LecternConfig,
    layout: StorageLayout,
    registry: RwLock<DocumentRegistry>,
    lexical: RwLock<LexicalIndex>,
    vector: RwLock<VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    converter: Converter,
    splitter: Option<Arc<dyn TextSplit>>,
}

impl Lectern {
    /// Open with default converter and no custom splitter.
    pub fn open(config: LecternConfig, embeddings: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        LecternBuilder::new(config, embeddings).open()
    }

    /// Start a builder to customize collaborators.
    pub fn builder(config: LecternConfig, embeddings: Arc<dyn EmbeddingProvider>) -> LecternBuilder {
        LecternBuilder::new(config, embeddings)
    }

    /// Number of registered documents.
    pub fn document_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Fetch a document record by id.
    pub fn document(&self, doc_id: &str) -> Result<Document> {
        self.registry
            .read()
            .get(doc_id)
            .cloned()
            .ok_or_else(|| LecternError::not_found(format!("document '{doc_id}'")))
    }

    /// Ingest text as a document, replacing any previous version.
    ///
    /// Returns the number of chunks indexed. Ingestion is all-or-nothing:
    /// chunking and embedding failures leave both indexes untouched, and a
    /// persistence failure rolls the in-memory swap back.
    pub fn ingest(
        &self,
        doc_id: &str,
        name: &str,
        text: &str,
        sizing: Option<ChunkSizing>,
    ) -> Result<usize> {
        self.ingest_inner(doc_id, name, text, sizing, 0, "", None)
    }

    /// Convert a file to markdown and ingest it under a generated id.
    ///
    /// Returns the new document id. The original file is copied next to the
    /// stored markdown.
    pub fn load_document<P: AsRef<Path>>(
        &self,
        path: P,
        tags: Option<BTreeSet<String>>,
    ) -> Result<String> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        if !self.converter.supports(&ext) {
            return Err(LecternError::conversion(format!(
                "unsupported file type '{ext}' for {} (supported: {:?})",
                path.display(),
                self.converter.supported_extensions()
            )));
        }

        let markdown = self.converter.convert(path)?;
        let file_size = fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut doc_id = Uuid::new_v4().simple().to_string();
        doc_id.truncate(12);

        fs::copy(path, self.layout.raw_path(&doc_id, &ext)?)?;
        self.ingest_inner(&doc_id, &name, &markdown, None, file_size, &ext, tags)?;

        tracing::info!("loaded {} as document '{doc_id}'", path.display());
        Ok(doc_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn ingest_inner(
        &self,
        doc_id: &str,
        name: &str,
        text: &str,
        sizing: Option<ChunkSizing>,
        file_size: u64,
        file_type: &str,
        extra_tags: Option<BTreeSet<String>>,
    ) -> Result<usize> {
        validate_doc_id(doc_id)?;

        let plan = chunker::resolve_split_plan(
            sizing,
            self.splitter.as_deref(),
            self.config.auto_chunk,
            text.len(),
        );
        let (chunks, recorded_sizing) = match plan {
            SplitPlan::Sized(sizing) => (chunker::chunk_text(text, doc_id, sizing)?, Some(sizing)),
            SplitPlan::Custom(splitter) => {
                (chunker::chunk_with_splitter(text, doc_id, splitter)?, None)
            }
        };

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embeddings.embed_documents(&texts)?
        };
        if embeddings.len() != chunks.len() {
            return Err(LecternError::index_consistency(format!(
                "embedding provider returned {} vectors for {} chunks of document '{doc_id}'",
                embeddings.len(),
                chunks.len()
            )));
        }
        if let Some(first) = embeddings.first() {
            if embeddings.iter().any(|e| e.len() != first.len()) {
                return Err(LecternError::embedding(format!(
                    "embedding provider returned vectors of differing dimensions for document '{doc_id}'"
                )));
            }
        }
        let records: Vec<VectorRecord> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord { chunk, embedding })
            .collect();

        self.layout.write_content(doc_id, text)?;

        let toc = extract_toc(text);
        let num_lines = chunker::count_lines(text);
        let now = Utc::now();
        let chunk_count = chunks.len();

        let mut registry = self.registry.write();
        let (created_at, mut tags) = match registry.get(doc_id) {
            Some(existing) => (existing.created_at, existing.tags.clone()),
            None => (now, BTreeSet::new()),
        };
        if let Some(extra) = extra_tags {
            tags.extend(extra);
        }

        {
            let mut lexical = self.lexical.write();
            let mut vector = self.vector.write();
            let previous = lexical.remove_document(doc_id);
            lexical.add_chunks(&chunks);
            if let Err(e) = vector.replace_document(doc_id, records) {
                lexical.remove_document(doc_id);
                lexical.add_chunks(&previous);
                return Err(e);
            }
        }

        registry.put(Document {
            id: doc_id.to_string(),
            name: name.to_string(),
            num_lines,
            table_of_contents: toc,
            tags,
            sizing: recorded_sizing,
            file_size,
            file_type: file_type.to_string(),
            created_at,
            updated_at: now,
        })?;

        tracing::info!("ingested document '{doc_id}' with {chunk_count} chunks");
        Ok(chunk_count)
    }

    /// Remove a document from the registry, both indexes, and disk.
    pub fn remove(&self, doc_id: &str) -> Result<()> {
        let mut registry = self.registry.write();
        if registry.remove(doc_id)?.is_none() {
            return Err(LecternError::not_found(format!("document '{doc_id}'")));
        }

        {
            let mut lexical = self.lexical.write();
            let mut vector = self.vector.write();
            lexical.remove_document(doc_id);
            vector.remove_document(doc_id)?;
        }
        self.layout.remove_doc(doc_id)?;

        tracing::info!("removed document '{doc_id}'");
        Ok(())
    }

    /// Search across all documents.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LecternError::validation("query must not be empty"));
        }
        if options.top_k == 0 {
            return Err(LecternError::validation("top_k must be positive"));
        }
        let strategy = options.strategy.unwrap_or(self.config.default_strategy);
        tracing::debug!(
            "search scope={} strategy={strategy} top_k={} query={query:?}",
            options.scope,
            options.top_k
        );

        let registry = self.registry.read();
        let allowed: Option<AHashSet<String>> = match &options.tags {
            Some(tags) => {
                let ids: AHashSet<String> = registry
                    .list_by_tags(tags)
                    .iter()
                    .map(|d| d.id.clone())
                    .collect();
                if ids.is_empty() {
                    return Ok(if options.scope == Scope::Contents && !options.aggregate {
                        SearchResults::Chunks(Vec::new())
                    } else {
                        SearchResults::Documents(Vec::new())
                    });
                }
                Some(ids)
            }
            None => None,
        };

        match options.scope {
            Scope::Names => Ok(SearchResults::Documents(search_names(
                &registry,
                query,
                options.top_k,
                allowed.as_ref(),
            ))),
            Scope::Contents => {
                if options.aggregate {
                    let fetch = options.top_k.saturating_mul(3);
                    let hits = self.search_chunks(query, fetch, strategy, allowed.as_ref())?;
                    Ok(SearchResults::Documents(aggregate_hits(
                        &registry,
                        hits,
                        options.top_k,
                    )))
                } else {
                    let hits =
                        self.search_chunks(query, options.top_k, strategy, allowed.as_ref())?;
                    let hits = hits
                        .into_iter()
                        .map(|hit| ContentSearchHit {
                            doc_name: registry.get(&hit.chunk.doc_id).map(|d| d.name.clone()),
                            doc_id: hit.chunk.doc_id,
                            start_line: hit.chunk.start_line,
                            end_line: hit.chunk.end_line,
                            text: hit.chunk.text,
                            score: hit.score,
                        })
                        .collect();
                    Ok(SearchResults::Chunks(hits))
                }
            }
        }
    }

    /// Search within a single document, returning chunk-level hits.
    pub fn search_within(
        &self,
        doc_id: &str,
        query: &str,
        top_k: usize,
        strategy: Option<Strategy>,
    ) -> Result<Vec<ContentSearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LecternError::validation("query must not be empty"));
        }
        if top_k == 0 {
            return Err(LecternError::validation("top_k must be positive"));
        }
        if self.registry.read().get(doc_id).is_none() {
            return Err(LecternError::not_found(format!("document '{doc_id}'")));
        }

        let strategy = strategy.unwrap_or(self.config.default_strategy);
        let allowed: AHashSet<String> = [doc_id.to_string()].into_iter().collect();
        let hits = self.search_chunks(query, top_k, strategy, Some(&allowed))?;

        Ok(hits
            .into_iter()
            .map(|hit| ContentSearchHit {
                doc_id: hit.chunk.doc_id,
                doc_name: None,
                start_line: hit.chunk.start_line,
                end_line: hit.chunk.end_line,
                text: hit.chunk.text,
                score: hit.score,
            })
            .collect())
    }

    /// Read a range of lines from a document's stored text.
    ///
    /// The range is clamped to `[1, num_lines]`; a range that is empty after
    /// clamping is a validation error.
    pub fn read(&self, doc_id: &str, start_line: usize, end_line: usize) -> Result<Excerpt> {
        if self.registry.read().get(doc_id).is_none() {
            return Err(LecternError::not_found(format!("document '{doc_id}'")));
        }

        let content = self.layout.read_content(doc_id)?;
        let lines: Vec<&str> = content.split('\n').collect();
        let total_lines = lines.len();

        let start = start_line.max(1);
        let end = end_line.min(total_lines);
        if start > end {
            return Err(LecternError::validation(format!(
                "invalid line range {start_line}..{end_line} for document '{doc_id}' ({total_lines} lines)"
            )));
        }

        Ok(Excerpt {
            doc_id: doc_id.to_string(),
            start_line: start,
            end_line: end,
            text: lines[start - 1..end].join("\n"),
            total_lines,
        })
    }

    /// Add tags to a document.
    pub fn tag_document(&self, doc_id: &str, tags: &BTreeSet<String>) -> Result<()> {
        let mut registry = self.registry.write();
        let mut doc = registry
            .get(doc_id)
            .cloned()
            .ok_or_else(|| LecternError::not_found(format!("document '{doc_id}'")))?;
        doc.tags.extend(tags.iter().cloned());
        doc.updated_at = Utc::now();
        registry.put(doc)
    }

    /// Remove tags from a document.
    pub fn untag_document(&self, doc_id: &str, tags: &BTreeSet<String>) -> Result<()> {
        let mut registry = self.registry.write();
        let mut doc = registry
            .get(doc_id)
            .cloned()
            .ok_or_else(|| LecternError::not_found(format!("document '{doc_id}'")))?;
        for tag in tags {
            doc.tags.remove(tag);
        }
        doc.updated_at = Utc::now();
        registry.put(doc)
    }

    /// All tags across all documents.
    pub fn list_tags(&self) -> BTreeSet<String> {
        self.registry.read().all_tags()
    }

    /// List documents, optionally restricted to a tag filter (OR semantics).
    pub fn list_documents(&self, tags: Option<&BTreeSet<String>>) -> Vec<SearchHit> {
        let registry = self.registry.read();
        let docs: Vec<&Document> = match tags {
            Some(tags) => registry.list_by_tags(tags),
            None => registry.list().collect(),
        };
        docs.into_iter().map(|doc| doc_hit(doc, 0.0, None)).collect()
    }

    /// Run one retrieval strategy over the chunk corpus.
    fn search_chunks(
        &self,
        query: &str,
        fetch: usize,
        strategy: Strategy,
        allowed: Option<&AHashSet<String>>,
    ) -> Result<RankList> {
        match strategy {
            Strategy::Bm25 => Ok(self.lexical.read().search(query, fetch, allowed)),
            Strategy::Vector => {
                let embedding = self.embeddings.embed_query(query)?;
                self.vector.read().search(
                    &embedding,
                    fetch,
                    allowed,
                    self.config.similarity_threshold,
                )
            }
            Strategy::Hybrid => {
                let lexical_hits = self.lexical.read().search(query, fetch, allowed);
                let embedding = self.embeddings.embed_query(query)?;
                let vector_hits = self.vector.read().search(
                    &embedding,
                    fetch,
                    allowed,
                    self.config.similarity_threshold,
                )?;
                Ok(reciprocal_rank_fusion(
                    &[lexical_hits, vector_hits],
                    self.config.rrf_k,
                    fetch,
                ))
            }
        }
    }
}

fn doc_hit(doc: &Document, score: f32, snippet: Option<String>) -> SearchHit {
    SearchHit {
        id: doc.id.clone(),
        name: doc.name.clone(),
        num_lines: doc.num_lines,
        table_of_contents: doc.format_toc(),
        tags: doc.tags.clone(),
        score,
        snippet,
    }
}

/// Lightweight name matching: case-insensitive, exact match above substring.
fn search_names(
    registry: &DocumentRegistry,
    query: &str,
    top_k: usize,
    allowed: Option<&AHashSet<String>>,
) -> Vec<SearchHit> {
    let query = query.to_lowercase();
    let mut scored: Vec<(&Document, f32)> = registry
        .list()
        .filter(|doc| allowed.is_none_or(|ids| ids.contains(&doc.id)))
        .filter_map(|doc| {
            let name = doc.name.to_lowercase();
            if name == query {
                Some((doc, 1.0))
            } else if name.contains(&query) {
                Some((doc, 0.5))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.name.cmp(&b.0.name))
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
    scored.truncate(top_k);
    scored
        .into_iter()
        .map(|(doc, score)| doc_hit(doc, score, None))
        .collect()
}

/// Collapse ranked chunk hits into one hit per document.
///
/// The input is already sorted best-first, so the first hit seen for a
/// document carries both its maximum chunk score and its best fused rank.
fn aggregate_hits(registry: &DocumentRegistry, hits: RankList, top_k: usize) -> Vec<SearchHit> {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut out = Vec::new();

    for hit in hits {
        if seen.contains(hit.chunk.doc_id.as_str()) {
            continue;
        }
        let Some(doc) = registry.get(&hit.chunk.doc_id) else {
            continue;
        };
        seen.insert(hit.chunk.doc_id.clone());
        let snippet: String = hit.chunk.text.chars().take(200).collect();
        out.push(doc_hit(doc, hit.score, Some(snippet)));
        if out.len() == top_k {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LecternError;

    struct BagOfWords;

    const DIM: usize = 32;

    fn bucket(word: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in word.bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x100_0000_01b3);
        }
        (hash % DIM as u64) as usize
    }

    fn embed_one(text: &str) -> Vec<f32> {
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
            Ok(texts.iter().map(|t| embed_one(t)).collect())
        }
    }

    fn open_engine(dir: &Path) -> Lectern {
        Lectern::open(LecternConfig::new(dir), Arc::new(BagOfWords)).unwrap()
    }

    #[test]
    fn test_strategy_and_scope_parsing() {
        assert_eq!("bm25".parse::<Strategy>().unwrap(), Strategy::Bm25);
        assert_eq!("vector".parse::<Strategy>().unwrap(), Strategy::Vector);
        assert_eq!("hybrid".parse::<Strategy>().unwrap(), Strategy::Hybrid);
        assert!(matches!(
            "fulltext".parse::<Strategy>(),
            Err(LecternError::Validation(_))
        ));

        assert_eq!("names".parse::<Scope>().unwrap(), Scope::Names);
        assert_eq!("contents".parse::<Scope>().unwrap(), Scope::Contents);
        assert!(matches!(
            "body".parse::<Scope>(),
            Err(LecternError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_query_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let err = engine.search("   ", &SearchOptions::default()).unwrap_err();
        assert!(matches!(err, LecternError::Validation(_)));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let options = SearchOptions {
            top_k: 0,
            ..Default::default()
        };
        let err = engine.search("query", &options).unwrap_err();
        assert!(matches!(err, LecternError::Validation(_)));
    }

    #[test]
    fn test_read_clamps_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let text: String = (1..=50)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        engine.ingest("doc", "doc.md", &text, None).unwrap();

        let excerpt = engine.read("doc", 1, 10).unwrap();
        assert_eq!(excerpt.start_line, 1);
        assert_eq!(excerpt.end_line, 10);
        assert!(excerpt.text.starts_with("line 1\n"));
        assert!(excerpt.text.ends_with("line 10"));

        let excerpt = engine.read("doc", 45, 100).unwrap();
        assert_eq!(excerpt.end_line, 50);
        assert_eq!(excerpt.total_lines, 50);

        assert!(matches!(
            engine.read("doc", 30, 10).unwrap_err(),
            LecternError::Validation(_)
        ));
        assert!(matches!(
            engine.read("doc", 51, 60).unwrap_err(),
            LecternError::Validation(_)
        ));
        assert!(matches!(
            engine.read("missing", 1, 10).unwrap_err(),
            LecternError::NotFound(_)
        ));
    }

    #[test]
    fn test_name_scope_search() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        engine.ingest("a", "rust-guide.md", "guide body", None).unwrap();
        engine.ingest("b", "python-notes.md", "notes body", None).unwrap();

        let options = SearchOptions {
            scope: Scope::Names,
            ..Default::default()
        };
        let hits = engine
            .search("rust-guide.md", &options)
            .unwrap()
            .into_documents()
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].score, 1.0);

        let hits = engine
            .search("notes", &options)
            .unwrap()
            .into_documents()
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[0].score, 0.5);
    }

    #[test]
    fn test_invalid_doc_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        assert!(matches!(
            engine.ingest("a/b", "n", "text", None).unwrap_err(),
            LecternError::Validation(_)
        ));
        assert!(matches!(
            engine.ingest("", "n", "text", None).unwrap_err(),
            LecternError::Validation(_)
        ));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        assert!(matches!(
            engine.remove("ghost").unwrap_err(),
            LecternError::NotFound(_)
        ));
    }

    #[test]
    fn test_embedding_failure_leaves_no_partial_state() {
        struct Failing;
        impl EmbeddingProvider for Failing {
            fn embed_documents(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
                Err(LecternError::embedding("provider unavailable"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let engine =
            Lectern::open(LecternConfig::new(dir.path()), Arc::new(Failing)).unwrap();
        let err = engine.ingest("doc", "doc.md", "some text", None).unwrap_err();
        assert!(matches!(err, LecternError::Embedding(_)));
        assert_eq!(engine.document_count(), 0);
        assert!(matches!(
            engine.document("doc").unwrap_err(),
            LecternError::NotFound(_)
        ));
    }
}
