//! Prompt assembly for Bowtie extraction

use crate::ExtractorError;
use bowtie_domain::{BarrierStatus, BarrierType, Confidence, LineOfDefense, PromptAssembler, Side};
use std::fs;
use std::path::Path;

const SCHEMA_PLACEHOLDER: &str = "{{SCHEMA_TEMPLATE}}";
const TEXT_PLACEHOLDER: &str = "{{INCIDENT_TEXT}}";
const ENUM_PLACEHOLDER: &str = "{{ENUM_CONSTRAINTS}}";

/// Fills a prompt template with the schema, the closed value sets and the narrative
///
/// Templates may use `{{SCHEMA_TEMPLATE}}`, `{{ENUM_CONSTRAINTS}}` and
/// `{{INCIDENT_TEXT}}`. The enum section is generated from the domain enums
/// so the prompt can never drift from what the validator accepts.
#[derive(Debug, Clone)]
pub struct TemplatePromptAssembler {
    prefix: String,
    suffix: String,
}

impl TemplatePromptAssembler {
    /// Build from template and schema text
    pub fn new(template: &str, schema: &str) -> Self {
        let filled = template
            .replace(SCHEMA_PLACEHOLDER, schema.trim())
            .replace(ENUM_PLACEHOLDER, &enum_constraints());
        let (prefix, suffix) = match filled.split_once(TEXT_PLACEHOLDER) {
            Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
            None => (format!("{}\n\nIncident text:\n", filled.trim_end()), String::new()),
        };
        Self { prefix, suffix }
    }

    /// Load the template and schema from files
    pub fn from_files(prompt_path: &Path, schema_path: &Path) -> Result<Self, ExtractorError> {
        let template = fs::read_to_string(prompt_path).map_err(|_| ExtractorError::Template {
            kind: "Prompt",
            path: prompt_path.to_path_buf(),
        })?;
        let schema = fs::read_to_string(schema_path).map_err(|_| ExtractorError::Template {
            kind: "Schema",
            path: schema_path.to_path_buf(),
        })?;
        Ok(Self::new(&template, &schema))
    }
}

impl Default for TemplatePromptAssembler {
    fn default() -> Self {
        Self::new(PROMPT_TEMPLATE, SCHEMA_TEMPLATE)
    }
}

impl PromptAssembler for TemplatePromptAssembler {
    fn assemble(&self, incident_text: &str) -> String {
        let text = incident_text.trim();
        let mut prompt = String::with_capacity(self.prefix.len() + text.len() + self.suffix.len());
        prompt.push_str(&self.prefix);
        prompt.push_str(text);
        prompt.push_str(&self.suffix);
        prompt
    }
}

/// Markdown list of every closed value set
fn enum_constraints() -> String {
    fn line(field: &str, allowed: Vec<&'static str>) -> String {
        let values: Vec<String> = allowed.iter().map(|v| format!("`{}`", v)).collect();
        format!("- `{}`: {}\n", field, values.join(", "))
    }

    let mut section = String::from("## Enum Constraints\n\n");
    section.push_str(&line(Side::FIELD, Side::allowed()));
    section.push_str(&line(BarrierType::FIELD, BarrierType::allowed()));
    section.push_str(&line(LineOfDefense::FIELD, LineOfDefense::allowed()));
    section.push_str(&line(
        &format!("performance.{}", BarrierStatus::FIELD),
        BarrierStatus::allowed(),
    ));
    section.push_str(&line(
        &format!("evidence.{}", Confidence::FIELD),
        Confidence::allowed(),
    ));
    section.push_str(
        "\nUse exactly these spellings. Do not invent new categories or synonyms; \
         use `unknown` when the text does not support a value.\n",
    );
    section
}

const PROMPT_TEMPLATE: &str = r#"You are a process safety analyst. Read the incident narrative below and
extract a Bowtie risk model as a single JSON object that follows the schema.

Rules:
- A Bowtie has one top event, the threats that can cause it (left side),
  the consequences that follow it (right side) and the controls (barriers)
  in between.
- Prevention controls link only to threats (`linked_threat_ids`).
  Mitigation controls link only to consequences (`linked_consequence_ids`).
- IDs: hazards `H-001`, threats `T-001`, consequences `CON-001`, controls
  `C-001`, numbered from 001 and unique within the record. Every linked ID
  must exist in the record.
- Every field ending in `_mentioned` is a boolean and must be `false` unless
  the narrative explicitly mentions it.
- `evidence.supporting_text` is a verbatim excerpt from the narrative, or an
  empty string.
- Use `null` or `unknown` instead of guessing.

{{ENUM_CONSTRAINTS}}
## Schema (Bowtie v2.2)

{{SCHEMA_TEMPLATE}}

## Incident narrative

---
{{INCIDENT_TEXT}}
---

Return ONLY the JSON object. No markdown code blocks, no explanations."#;

const SCHEMA_TEMPLATE: &str = r#"{
  "incident_id": "string",
  "source": {"agency": "string|null", "url": "string|null", "date_published": "string|null"},
  "event": {"top_event": "string", "incident_type": "string|null", "summary": "string", "costs": "number|null"},
  "bowtie": {
    "top_event": "string",
    "hazards": [{"id": "H-001", "name": "string"}],
    "threats": [{"threat_id": "T-001", "name": "string"}],
    "consequences": [{"id": "CON-001", "name": "string"}],
    "controls": [{
      "control_id": "C-001",
      "name": "string",
      "side": "prevention|mitigation",
      "barrier_type": "engineering|administrative|ppe|unknown",
      "line_of_defense": "1st|2nd|3rd|recovery|unknown",
      "linked_threat_ids": ["T-001"],
      "linked_consequence_ids": [],
      "linked_hazard_ids": ["H-001"],
      "performance": {"barrier_status": "active|degraded|failed|bypassed|not_installed|unknown"},
      "human": {"training_mentioned": false, "supervision_mentioned": false},
      "evidence": {"supporting_text": "string", "confidence": "high|medium|low"}
    }]
  },
  "pifs": {
    "people": {"fatigue_mentioned": false, "competence_mentioned": false},
    "work": {"procedures_mentioned": false, "workload_mentioned": false},
    "organisation": {"safety_culture_mentioned": false, "management_of_change_mentioned": false}
  },
  "notes": {"schema_version": "2.2", "rules": "string"}
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prompt_substitutes_placeholders() {
        let prompt = TemplatePromptAssembler::default().assemble("test incident text");
        assert!(!prompt.contains(SCHEMA_PLACEHOLDER));
        assert!(!prompt.contains(TEXT_PLACEHOLDER));
        assert!(!prompt.contains(ENUM_PLACEHOLDER));
        assert!(prompt.contains("test incident text"));
    }

    #[test]
    fn test_prompt_contains_schema() {
        let prompt = TemplatePromptAssembler::default().assemble("A gas leak occurred.");
        assert!(prompt.contains("incident_id"));
        assert!(prompt.contains("control_id"));
        assert!(prompt.contains("barrier_status"));
        assert!(prompt.contains("schema_version"));
        assert!(prompt.contains("Bowtie"));
    }

    #[test]
    fn test_prompt_contains_enum_constraints() {
        let prompt = TemplatePromptAssembler::default().assemble("Some incident text.");
        assert!(prompt.contains("Enum Constraints"));
        assert!(prompt.contains("`engineering`, `administrative`, `ppe`, `unknown`"));
        assert!(prompt.contains("`1st`, `2nd`, `3rd`, `recovery`, `unknown`"));
        assert!(prompt.contains("`active`, `degraded`, `failed`, `bypassed`, `not_installed`, `unknown`"));
        assert!(prompt.contains("`high`, `medium`, `low`"));
        assert!(prompt.contains("`prevention`, `mitigation`"));
        assert!(prompt.contains("Do not invent new categories"));
    }

    #[test]
    fn test_narrative_is_placed_last() {
        let prompt = TemplatePromptAssembler::default().assemble("  narrative body \n");
        let schema_at = prompt.find("schema_version").unwrap();
        let text_at = prompt.find("narrative body").unwrap();
        assert!(text_at > schema_at);
        assert!(prompt.contains("---\nnarrative body\n---"));
    }

    #[test]
    fn test_template_without_text_placeholder_appends_text() {
        let assembler = TemplatePromptAssembler::new("Schema: {{SCHEMA_TEMPLATE}}", "{}");
        assert_eq!(assembler.assemble("body"), "Schema: {}\n\nIncident text:\nbody");
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let prompt_path = dir.path().join("prompt.md");
        let schema_path = dir.path().join("schema.json");
        fs::File::create(&prompt_path)
            .unwrap()
            .write_all(b"S={{SCHEMA_TEMPLATE}} T={{INCIDENT_TEXT}}")
            .unwrap();
        fs::write(&schema_path, "{\"x\": 1}").unwrap();

        let assembler = TemplatePromptAssembler::from_files(&prompt_path, &schema_path).unwrap();
        assert_eq!(assembler.assemble("hi"), "S={\"x\": 1} T=hi");

        let missing = TemplatePromptAssembler::from_files(Path::new("/nonexistent/prompt.md"), &schema_path);
        assert!(matches!(missing, Err(ExtractorError::Template { kind: "Prompt", .. })));
    }
}
