//! Crate-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`CatalogError`], [`EnrichmentError`], [`AugmentError`]), while the
//! CLI uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum, aggregating subsystem errors
//! - Subsystem errors keep enough detail for callers that want to match
//!   on them (the orchestrator downgrades some of them to "no results")
//!
//! # Example
//!
//! ```ignore
//! use music_matcher::error::{Error, Result, ResultExt};
//!
//! fn load(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_context("reading catalog")
//! }
//! ```

use std::path::PathBuf;

use crate::augment::AugmentError;
use crate::catalog::CatalogError;
use crate::enrichment::EnrichmentError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag reading error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Catalog mirror or remote catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Fingerprinting/AcoustID error
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// Augmentation error
    #[error("Augmentation error: {0}")]
    Augment(#[from] AugmentError),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, CatalogError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Catalog(e).context(ctx))
    }
}
