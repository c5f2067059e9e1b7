//! Deterministic stub provider
//!
//! Returns the same schema-valid record for every prompt, so the whole
//! pipeline can run without network access or credentials.

use bowtie_domain::{ExtractionProvider, ProviderError};

/// Fixed response returned by [`StubProvider`]
pub const STUB_RESPONSE: &str = r#"{
  "incident_id": "STUB-001",
  "source": {"agency": "stub", "url": null, "date_published": null},
  "event": {
    "top_event": "Loss of containment",
    "incident_type": "release",
    "summary": "Stub incident: hydrocarbon release from a corroded flowline.",
    "costs": null
  },
  "bowtie": {
    "top_event": "Loss of containment",
    "hazards": [
      {"id": "H-001", "name": "Pressurized hydrocarbons"}
    ],
    "threats": [
      {"threat_id": "T-001", "name": "Internal corrosion of flowline"}
    ],
    "consequences": [
      {"id": "CON-001", "name": "Fire or explosion"}
    ],
    "controls": [
      {
        "control_id": "C-001",
        "name": "Corrosion monitoring program",
        "side": "prevention",
        "barrier_type": "administrative",
        "line_of_defense": "1st",
        "linked_threat_ids": ["T-001"],
        "linked_consequence_ids": [],
        "linked_hazard_ids": ["H-001"],
        "performance": {"barrier_status": "degraded", "barrier_failed": false},
        "human": {"training_mentioned": false, "supervision_mentioned": false},
        "evidence": {"supporting_text": "", "confidence": "medium"}
      },
      {
        "control_id": "C-002",
        "name": "Gas detection and emergency shutdown",
        "side": "mitigation",
        "barrier_type": "engineering",
        "line_of_defense": "recovery",
        "linked_threat_ids": [],
        "linked_consequence_ids": ["CON-001"],
        "linked_hazard_ids": ["H-001"],
        "performance": {"barrier_status": "active", "barrier_failed": false},
        "human": {"training_mentioned": false, "supervision_mentioned": false},
        "evidence": {"supporting_text": "", "confidence": "low"}
      }
    ]
  },
  "pifs": {
    "people": {"fatigue_mentioned": false, "competence_mentioned": false, "communication_mentioned": false},
    "work": {"procedures_mentioned": false, "workload_mentioned": false},
    "organisation": {"safety_culture_mentioned": false, "management_of_change_mentioned": false}
  },
  "notes": {"schema_version": "2.2", "rules": "stub output"}
}"#;

/// Provider that always returns [`STUB_RESPONSE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProvider;

impl StubProvider {
    /// Create a stub provider
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn extract(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok(STUB_RESPONSE.to_string())
    }
}
