//! Bowtie Quality Gate
//!
//! Post-hoc metrics over a directory of extracted incident records.
//!
//! # Overview
//!
//! The Quality Gate runs after extraction and reads only persisted JSON. It
//! reports, across the corpus:
//! - **Validity**: records that still pass the Gatekeeper, and the anomalies that do not
//! - **Confidence**: mean and mode of evidence confidence per barrier type
//! - **Coverage**: share of hazards, threats and consequences with a linked control
//! - **Mentions**: share of `*_mentioned` flags set to `true`
//!
//! The report is a pure function of the directory contents.
//!
//! # Usage
//!
//! ```no_run
//! use bowtie_quality::{QualityGate, QualityThresholds};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = QualityGate::default().compute(Path::new("data/structured/incidents/openai"))?;
//! println!("{}", report.to_json()?);
//!
//! for failure in report.check(&QualityThresholds::strict()) {
//!     eprintln!("gate failed: {}", failure);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod metrics;

pub use config::QualityThresholds;
pub use error::QualityError;
pub use gate::QualityGate;
pub use metrics::{ConfidenceStats, Coverage, GateFailure, MentionStats, QualityReport, Ratio};
