//! JSON-backed document registry.
//!
//! A key-value store over [`Document`] records keyed by document id,
//! persisted to `metadata.json` under the storage root. The registry is the
//! source of truth for which documents exist; the retrieval indexes are
//! rebuilt or loaded against it at startup.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::storage::StorageLayout;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    documents: BTreeMap<String, Document>,
}

/// The document metadata registry.
#[derive(Debug)]
pub struct DocumentRegistry {
    layout: StorageLayout,
    docs: BTreeMap<String, Document>,
}

impl DocumentRegistry {
    /// Open the registry under the given layout, loading `metadata.json`
    /// when present.
    pub fn open(layout: StorageLayout) -> Result<Self> {
        let path = layout.metadata_path();
        let docs = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: RegistryFile = serde_json::from_str(&raw)?;
            file.documents
        } else {
            BTreeMap::new()
        };
        Ok(DocumentRegistry { layout, docs })
    }

    fn save(&self) -> Result<()> {
        let file = RegistryFile {
            documents: self.docs.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)?;
        std::fs::write(self.layout.metadata_path(), raw)?;
        Ok(())
    }

    /// Insert or replace a document record.
    pub fn put(&mut self, doc: Document) -> Result<()> {
        self.docs.insert(doc.id.clone(), doc);
        self.save()
    }

    /// Look up a document by id.
    pub fn get(&self, doc_id: &str) -> Option<&Document> {
        self.docs.get(doc_id)
    }

    /// Remove a document record, returning it if present.
    pub fn remove(&mut self, doc_id: &str) -> Result<Option<Document>> {
        let doc = self.docs.remove(doc_id);
        if doc.is_some() {
            self.save()?;
        }
        Ok(doc)
    }

    /// All documents, in stable id order.
    pub fn list(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    /// Documents matching ANY of the given tags.
    pub fn list_by_tags(&self, tags: &BTreeSet<String>) -> Vec<&Document> {
        self.docs
            .values()
            .filter(|doc| doc.tags.intersection(tags).next().is_some())
            .collect()
    }

    /// The union of all tags across all documents.
    pub fn all_tags(&self) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        for doc in self.docs.values() {
            tags.extend(doc.tags.iter().cloned());
        }
        tags
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
