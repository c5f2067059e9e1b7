//! Incident record - the persisted Bowtie extraction for one narrative
//!
//! The typed view covers the fields the pipeline reasons about (ids, links,
//! enumerations, evidence). Everything else the extraction carries (event
//! summary, PIFs, notes) rides along untouched in the `extra` maps so a
//! record can be read and rewritten without losing data.

use crate::enums::{BarrierStatus, BarrierType, Confidence, LineOfDefense, Side};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Schema version emitted in `notes.schema_version`
pub const SCHEMA_VERSION: &str = "2.2";

/// Validated structured extraction for one incident narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Stable identifier derived from the source filename
    pub incident_id: String,

    /// Hazards, threats, controls and consequences
    pub bowtie: Bowtie,

    /// Remaining top-level sections (event, pifs, notes, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The Bowtie diagram itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bowtie {
    /// Central hazards
    #[serde(default)]
    pub hazards: Vec<Hazard>,

    /// Left-side threats
    #[serde(default)]
    pub threats: Vec<Threat>,

    /// Barrier controls on either side
    #[serde(default)]
    pub controls: Vec<Control>,

    /// Right-side consequences
    #[serde(default)]
    pub consequences: Vec<Consequence>,

    /// Other bowtie fields (top_event, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A hazard (`H-NNN`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Identifier, unique within the record
    pub id: String,
    /// Short name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Other hazard fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A threat (`T-NNN`) on the prevention side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    /// Identifier, unique within the record
    pub threat_id: String,
    /// Short name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Other threat fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A consequence (`CON-NNN`) on the mitigation side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    /// Identifier, unique within the record
    pub id: String,
    /// Short name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Other consequence fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A barrier control (`C-NNN`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Identifier, unique within the record
    pub control_id: String,
    /// Short name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Prevention or mitigation
    pub side: Side,
    /// Physical nature of the barrier
    pub barrier_type: BarrierType,
    /// Position in the defense sequence
    pub line_of_defense: LineOfDefense,
    /// Threats this control guards against (prevention side only)
    #[serde(default, deserialize_with = "null_as_default")]
    pub linked_threat_ids: Vec<String>,
    /// Consequences this control limits (mitigation side only)
    #[serde(default, deserialize_with = "null_as_default")]
    pub linked_consequence_ids: Vec<String>,
    /// Hazards this control addresses
    #[serde(default, deserialize_with = "null_as_default")]
    pub linked_hazard_ids: Vec<String>,
    /// How the barrier performed
    pub performance: Performance,
    /// Textual backing for the control
    pub evidence: Evidence,
    /// Other control fields (human factors, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Barrier performance during the incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Observed barrier state
    pub barrier_status: BarrierStatus,
    /// Other performance fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Evidence backing a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Verbatim excerpt from the narrative, or empty
    #[serde(default)]
    pub supporting_text: String,
    /// Evidence strength
    pub confidence: Confidence,
    /// Other evidence fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IncidentRecord {
    /// Controls on one side of the top event
    pub fn controls_on(&self, side: Side) -> impl Iterator<Item = &Control> {
        self.bowtie.controls.iter().filter(move |c| c.side == side)
    }

    /// Schema version recorded in `notes`, if any
    pub fn schema_version(&self) -> Option<&str> {
        self.extra
            .get("notes")
            .and_then(|n| n.get("schema_version"))
            .and_then(Value::as_str)
    }
}

/// Read an explicit `null` (unknown) as the empty default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Derive an incident id from a source filename (the file stem)
///
/// Returns `None` for paths without a usable UTF-8 stem.
///
/// # Examples
///
/// ```
/// use bowtie_domain::incident_id_from_path;
/// use std::path::Path;
///
/// assert_eq!(incident_id_from_path(Path::new("text/CSB-2019-07.txt")).as_deref(), Some("CSB-2019-07"));
/// ```
pub fn incident_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.trim();
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}
