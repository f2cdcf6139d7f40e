//! On-disk layout manager.
//!
//! All persistent state lives under one explicitly configured root
//! directory. No implicit global state, no environment lookups.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!     docs/<doc_id>/raw.<ext>    original file (load path only)
//!     docs/<doc_id>/content.md   stored line-addressable markdown
//!     index/vectors/<doc_id>.bin vector index records, one file per doc
//!     metadata.json              document registry
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LecternError, Result};

/// Manages the directory layout under the storage root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Open (creating if needed) the layout rooted at `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(StorageLayout { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document registry file.
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    /// Directory holding per-document vector files, created on demand.
    pub fn vectors_dir(&self) -> Result<PathBuf> {
        let dir = self.root.join("index").join("vectors");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// A document's directory, created on demand.
    pub fn doc_dir(&self, doc_id: &str) -> Result<PathBuf> {
        let dir = self.root.join("docs").join(doc_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Path for a document's original file copy.
    pub fn raw_path(&self, doc_id: &str, suffix: &str) -> Result<PathBuf> {
        Ok(self.doc_dir(doc_id)?.join(format!("raw{suffix}")))
    }

    /// Path for a document's stored markdown.
    pub fn content_path(&self, doc_id: &str) -> Result<PathBuf> {
        Ok(self.doc_dir(doc_id)?.join("content.md"))
    }

    /// Write a document's markdown content.
    pub fn write_content(&self, doc_id: &str, text: &str) -> Result<()> {
        fs::write(self.content_path(doc_id)?, text)?;
        Ok(())
    }

    /// Read a document's stored markdown content.
    pub fn read_content(&self, doc_id: &str) -> Result<String> {
        let path = self.content_path(doc_id)?;
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LecternError::not_found(format!("stored content for document '{doc_id}'"))
            } else {
                LecternError::Io(e)
            }
        })
    }

    /// Remove a document's directory and everything in it.
    pub fn remove_doc(&self, doc_id: &str) -> Result<()> {
        let dir = self.root.join("docs").join(doc_id);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Check that a caller-supplied document id is safe to embed in paths.
pub fn validate_doc_id(doc_id: &str) -> Result<()> {
    if doc_id.is_empty() {
        return Err(LecternError::validation("document id must not be empty"));
    }
    if doc_id.contains(['/', '\\']) || doc_id == "." || doc_id == ".." {
        return Err(LecternError::validation(format!(
            "document id '{doc_id}' must not contain path separators"
        )));
    }
    Ok(())
}
