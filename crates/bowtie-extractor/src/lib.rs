//! Bowtie Extractor
//!
//! Turns a directory of incident narratives into validated Bowtie records.
//!
//! # Overview
//!
//! For each `*.txt` input the Extractor assembles a prompt, calls the
//! configured provider, parses the reply as a single JSON document, validates
//! it with the Gatekeeper and writes the record. Progress is kept in a CSV
//! manifest so an interrupted run can be resumed without redoing work.
//!
//! # Architecture
//!
//! ```text
//! text/*.txt → Extractor → Provider → Parser → Gatekeeper → incidents/<provider>/*.json
//!                  │
//!                  └──────────────→ ManifestStore (one row per input)
//! ```
//!
//! # Key Features
//!
//! - **Bounded worker pool**: `workers` inputs in flight, one writer
//! - **Retry with backoff**: only transient provider failures are retried
//! - **Resume**: inputs already `valid` with an existing output are skipped
//! - **Graceful shutdown**: in-flight rows are reverted, never left `in_progress`
//!
//! # Example Usage
//!
//! ```no_run
//! use bowtie_extractor::{Extractor, ExtractorConfig, RunOptions, TemplatePromptAssembler};
//! use bowtie_gatekeeper::Gatekeeper;
//! use bowtie_llm::StubProvider;
//! use bowtie_store::ManifestStore;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(
//!     StubProvider::new(),
//!     TemplatePromptAssembler::default(),
//!     Gatekeeper::default_config(),
//!     ExtractorConfig::default(),
//! );
//! let mut manifest = ManifestStore::open("data/manifests/structured_manifest.csv")?;
//!
//! let summary = extractor
//!     .run(
//!         Path::new("data/text"),
//!         Path::new("data/structured/incidents"),
//!         &mut manifest,
//!         RunOptions::resume(),
//!     )
//!     .await?;
//!
//! println!("valid: {}, invalid: {}, error: {}", summary.valid, summary.invalid, summary.error);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;


pub use config::{ExtractorConfig, RetryPolicy};
pub use error::{ExtractorError, ParseError};
pub use extractor::Extractor;
pub use parser::parse_response;
pub use prompt::TemplatePromptAssembler;
pub use types::{RunFailure, RunOptions, RunSummary, MAX_VIOLATIONS_IN_MESSAGE};
