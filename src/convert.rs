//! Document-to-markdown conversion.
//!
//! Conversion backends form a closed set of variants behind one capability
//! surface (`convert`, `supported_extensions`), selected explicitly at
//! construction time. The built-in [`Converter::Passthrough`] reads markdown
//! and plain-text files verbatim; [`Converter::custom`] wraps an arbitrary
//! caller-supplied callback, e.g. an external OCR pipeline.
//!
//! Converter failures surface as [`LecternError::Conversion`]; a failed
//! conversion never produces a partial document.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{LecternError, Result};

/// Callback signature for custom conversion backends.
pub type ConvertFn = dyn Fn(&Path) -> std::result::Result<String, String> + Send + Sync;

/// A document-to-markdown converter backend.
#[derive(Clone)]
pub enum Converter {
    /// Read the file verbatim; the input is already markdown or plain text.
    Passthrough,
    /// Caller-supplied conversion callback with its own extension set.
    Custom {
        /// Supported extensions including the leading dot; `".*"` means any.
        extensions: BTreeSet<String>,
        /// The conversion callback.
        convert: Arc<ConvertFn>,
    },
}

impl Converter {
    /// Wrap a conversion callback supporting the given extensions.
    ///
    /// Extensions include the leading dot (e.g. `".pdf"`); the wildcard
    /// `".*"` accepts any file.
    pub fn custom<F>(extensions: BTreeSet<String>, convert: F) -> Self
    where
        F: Fn(&Path) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Converter::Custom {
            extensions,
            convert: Arc::new(convert),
        }
    }

    /// The set of file extensions this backend accepts.
    pub fn supported_extensions(&self) -> BTreeSet<String> {
        match self {
            Converter::Passthrough => [".md", ".markdown", ".txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Converter::Custom { extensions, .. } => extensions.clone(),
        }
    }

    /// Whether a file extension (with leading dot, lowercased) is accepted.
    pub fn supports(&self, ext: &str) -> bool {
        let supported = self.supported_extensions();
        supported.contains(".*") || supported.contains(ext)
    }

    /// Convert a file to markdown text.
    pub fn convert(&self, path: &Path) -> Result<String> {
        match self {
            Converter::Passthrough => fs::read_to_string(path).map_err(|e| {
                LecternError::conversion(format!("failed to read {}: {e}", path.display()))
            }),
            Converter::Custom { convert, .. } => convert(path).map_err(|e| {
                LecternError::conversion(format!("converter failed on {}: {e}", path.display()))
            }),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Converter::Passthrough
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Passthrough => f.write_str("Converter::Passthrough"),
            Converter::Custom { extensions, .. } => f
                .debug_struct("Converter::Custom")
                .field("extensions", extensions)
                .field("convert", &"<callback>")
                .finish(),
        }
    }
}
