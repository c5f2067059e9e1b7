//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest encoding or decoding error
    #[error("Manifest format error: {0}")]
    Csv(#[from] csv::Error),

    /// A row that cannot be a manifest entry
    #[error("Invalid manifest row {row} in {path}: {reason}")]
    InvalidRow {
        /// Manifest file
        path: PathBuf,
        /// 1-based data row number
        row: usize,
        /// What is wrong with it
        reason: String,
    },
}
