//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider could not be constructed
    #[error("Provider error: {0}")]
    Provider(#[from] bowtie_domain::ProviderError),

    /// Extraction run failed as a whole
    #[error(transparent)]
    Extractor(#[from] bowtie_extractor::ExtractorError),

    /// Manifest could not be read
    #[error(transparent)]
    Store(#[from] bowtie_store::StoreError),

    /// Quality report could not be computed
    #[error(transparent)]
    Quality(#[from] bowtie_quality::QualityError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
