//! Fixed parts of the record contract

use std::fmt;

/// Top-level sections every record must carry as JSON objects
pub const REQUIRED_SECTIONS: &[&str] = &["event", "bowtie", "pifs", "notes"];

/// Bowtie lists that must be present as arrays
pub(crate) const BOWTIE_LISTS: &[&str] = &["hazards", "threats", "controls", "consequences"];

/// Namespaces of record identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdNamespace {
    /// `bowtie.hazards[].id`
    Hazard,
    /// `bowtie.threats[].threat_id`
    Threat,
    /// `bowtie.consequences[].id`
    Consequence,
    /// `bowtie.controls[].control_id`
    Control,
}

impl IdNamespace {
    /// Required id prefix, including the dash
    pub fn prefix(&self) -> &'static str {
        match self {
            IdNamespace::Hazard => "H-",
            IdNamespace::Threat => "T-",
            IdNamespace::Consequence => "CON-",
            IdNamespace::Control => "C-",
        }
    }

    /// Human-readable pattern
    pub fn pattern(&self) -> &'static str {
        match self {
            IdNamespace::Hazard => "H-NNN",
            IdNamespace::Threat => "T-NNN",
            IdNamespace::Consequence => "CON-NNN",
            IdNamespace::Control => "C-NNN",
        }
    }

    /// Bowtie list holding this namespace
    pub(crate) fn list(&self) -> &'static str {
        match self {
            IdNamespace::Hazard => "hazards",
            IdNamespace::Threat => "threats",
            IdNamespace::Consequence => "consequences",
            IdNamespace::Control => "controls",
        }
    }

    /// Id field name inside each list item
    pub(crate) fn id_field(&self) -> &'static str {
        match self {
            IdNamespace::Threat => "threat_id",
            IdNamespace::Control => "control_id",
            IdNamespace::Hazard | IdNamespace::Consequence => "id",
        }
    }

    /// Whether `id` is the prefix followed by exactly three ASCII digits
    pub fn matches(&self, id: &str) -> bool {
        id.strip_prefix(self.prefix())
            .map(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false)
    }
}

impl fmt::Display for IdNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdNamespace::Hazard => "hazard",
            IdNamespace::Threat => "threat",
            IdNamespace::Consequence => "consequence",
            IdNamespace::Control => "control",
        };
        f.write_str(name)
    }
}
