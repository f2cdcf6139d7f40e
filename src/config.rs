//! Knowledge-base configuration.
//!
//! All tunables live in one explicit struct passed at construction; there is
//! no implicit global state and no environment lookup. The storage root is
//! mandatory, everything else has defaults.

use std::path::PathBuf;

use crate::engine::Strategy;
use crate::error::{LecternError, Result};
use crate::hybrid::DEFAULT_RRF_K;

/// Configuration for a [`crate::engine::Lectern`] instance.
#[derive(Debug, Clone)]
pub struct LecternConfig {
    /// Root directory for all persistent state.
    pub storage_dir: PathBuf,
    /// Select chunk sizing automatically from document length when no
    /// explicit sizing or custom splitter applies.
    pub auto_chunk: bool,
    /// Dampening constant for reciprocal rank fusion.
    pub rrf_k: u32,
    /// Strategy used when a query does not name one.
    pub default_strategy: Strategy,
    /// Minimum normalized cosine score for vector hits, in `[0, 1]`.
    /// `None` disables the filter.
    pub similarity_threshold: Option<f32>,
}

impl LecternConfig {
    /// Create a configuration with defaults, rooted at `storage_dir`.
    pub fn new<P: Into<PathBuf>>(storage_dir: P) -> Self {
        LecternConfig {
            storage_dir: storage_dir.into(),
            auto_chunk: false,
            rrf_k: DEFAULT_RRF_K,
            default_strategy: Strategy::Hybrid,
            similarity_threshold: None,
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.rrf_k == 0 {
            return Err(LecternError::validation("rrf_k must be positive"));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(LecternError::validation(format!(
                    "similarity_threshold {threshold} must lie in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}
