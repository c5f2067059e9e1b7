//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
///
/// Structural checks (required sections, closed enumerations) are always on;
/// the toggles below cover the relational rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Enforce `C-NNN`, `T-NNN`, `CON-NNN`, `H-NNN` id patterns
    pub validate_id_patterns: bool,

    /// Enforce id uniqueness within each namespace
    pub validate_uniqueness: bool,

    /// Reject links to ids not present in the record
    pub validate_references: bool,

    /// Reject prevention controls linking consequences and mitigation controls linking threats
    pub validate_side_partition: bool,

    /// Require every `*_mentioned` field to be a boolean
    pub validate_mention_types: bool,

    /// Require `notes.schema_version` to equal this value
    pub required_schema_version: Option<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_id_patterns: true,
            validate_uniqueness: true,
            validate_references: true,
            validate_side_partition: true,
            validate_mention_types: true,
            required_schema_version: None,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (structure and enumerations only)
    pub fn permissive() -> Self {
        Self {
            validate_id_patterns: false,
            validate_uniqueness: true,
            validate_references: false,
            validate_side_partition: false,
            validate_mention_types: false,
            required_schema_version: None,
        }
    }

    /// Create a strict configuration (all validations, pinned schema version)
    pub fn strict() -> Self {
        Self {
            required_schema_version: Some(bowtie_domain::SCHEMA_VERSION.to_string()),
            ..Self::default()
        }
    }
}
