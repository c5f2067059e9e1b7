//! Bowtie Gatekeeper
//!
//! Schema validation for extracted incident records.
//!
//! The Gatekeeper checks a candidate document (raw JSON, as returned by the
//! model) against the fixed Bowtie contract:
//! - Required top-level sections
//! - Closed enumerations (`side`, `barrier_type`, `line_of_defense`,
//!   `barrier_status`, `confidence`)
//! - ID patterns and per-namespace uniqueness
//! - Referential integrity of control links
//! - Side partition (prevention links threats, mitigation links consequences)
//! - Boolean `*_mentioned` evidence flags
//!
//! Validation is a pure function: it never fails, it reports.
//!
//! # Examples
//!
//! ```
//! use bowtie_gatekeeper::{Gatekeeper, ValidationStatus};
//!
//! let gatekeeper = Gatekeeper::default_config();
//! let result = gatekeeper.validate_str("Sure! Here is the JSON you asked for");
//! assert_eq!(result.status, ValidationStatus::Rejected);
//! assert_eq!(result.messages(), vec!["not a structured document".to_string()]);
//! ```

#![warn(missing_docs)]

mod config;
mod schema;
mod validator;

pub use config::ValidationConfig;
pub use schema::{IdNamespace, REQUIRED_SECTIONS};
pub use validator::{Gatekeeper, ValidationResult, ValidationStatus, Violation, ViolationKind};
