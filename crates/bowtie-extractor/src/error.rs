//! Error types for the Extractor

use bowtie_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole run
///
/// Per-input failures never surface here; they are recorded in the manifest
/// and reported through [`RunSummary`](crate::RunSummary).
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid extractor configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input directory missing or unreadable
    #[error("Cannot read input directory {path}: {source}")]
    InputDir {
        /// Directory that was scanned
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Prompt or schema template missing or unreadable
    #[error("{kind} template not found: {path}")]
    Template {
        /// Which template (`Prompt` or `Schema`)
        kind: &'static str,
        /// Path that was tried
        path: PathBuf,
    },

    /// Manifest could not be persisted
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Why a raw response is not a single JSON document
#[derive(Error, Debug)]
pub enum ParseError {
    /// Response is blank
    #[error("empty response")]
    Empty,

    /// Code fence opened but the response is not exactly one fenced block
    #[error("response is not a single fenced JSON block")]
    Fence,

    /// Not JSON, or JSON followed or preceded by other text
    #[error("not a single JSON document: {0}")]
    Json(#[from] serde_json::Error),
}
