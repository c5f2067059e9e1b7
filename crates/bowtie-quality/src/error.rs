//! Error types for the Quality Gate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a quality computation
///
/// A single bad record never does; it is counted as an anomaly instead.
#[derive(Error, Debug)]
pub enum QualityError {
    /// Incident directory missing or unreadable
    #[error("Cannot read incident directory {path}: {source}")]
    Directory {
        /// Directory that was scanned
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Threshold values out of range
    #[error("Configuration error: {0}")]
    Config(String),
}
