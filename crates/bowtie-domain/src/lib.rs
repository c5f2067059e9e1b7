//! Bowtie Domain Layer
//!
//! Core data model for the Bowtie extraction pipeline. Every other crate in the
//! workspace depends on the types and trait seams defined here.
//!
//! ## Key Concepts
//!
//! - **IncidentRecord**: the validated Bowtie extraction for one narrative
//! - **Control**: a barrier on the prevention or mitigation side of the top event
//! - **ManifestEntry**: durable per-input processing state across runs
//! - **ExtractionProvider**: the narrow seam every LLM backend implements
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure (HTTP, files, CSV) lives in other crates
//! - Closed value sets are Rust enums; the raw JSON checks that reject
//!   near-miss synonyms live in `bowtie-gatekeeper`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod enums;
pub mod error;
pub mod manifest;
pub mod mentions;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use enums::{BarrierStatus, BarrierType, Confidence, LineOfDefense, Side};
pub use error::{ProviderError, ProviderErrorKind};
pub use manifest::{ManifestEntry, ManifestStatus};
pub use record::{
    incident_id_from_path, Bowtie, Consequence, Control, Evidence, Hazard, IncidentRecord,
    Performance, Threat, SCHEMA_VERSION,
};
pub use traits::{ExtractionProvider, PromptAssembler};
