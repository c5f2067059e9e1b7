//! Record validation logic

use crate::schema::{IdNamespace, BOWTIE_LISTS, REQUIRED_SECTIONS};
use crate::ValidationConfig;
use bowtie_domain::mentions::visit_mentions;
use bowtie_domain::{BarrierStatus, BarrierType, Confidence, IncidentRecord, LineOfDefense, Side};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Result of record validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the record passed validation
    pub status: ValidationStatus,

    /// Violations in document order (empty when accepted)
    pub violations: Vec<Violation>,
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Record accepted
    Accepted,

    /// Record rejected
    Rejected,
}

/// A single contract violation
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Dotted path of the offending field (`bowtie.controls[2].side`)
    pub path: String,

    /// What is wrong with it
    pub kind: ViolationKind,
}

/// Kinds of contract violation
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// Input is not a JSON object (or not JSON at all)
    NotStructured,

    /// Required field absent
    MissingField,

    /// Field present with the wrong JSON type
    WrongType {
        /// Expected type description
        expected: &'static str,
    },

    /// Value outside a closed enumeration
    IllegalValue {
        /// Offending value, as JSON text
        value: String,
        /// The closed set
        allowed: Vec<&'static str>,
    },

    /// Identifier does not follow its namespace pattern
    BadIdPattern {
        /// Offending id
        value: String,
        /// Required pattern
        pattern: &'static str,
    },

    /// Identifier repeated within its namespace
    DuplicateId {
        /// Repeated id
        value: String,
    },

    /// Link to an id not present in the record
    DanglingReference {
        /// Referenced id
        value: String,
        /// Namespace the id should live in
        namespace: IdNamespace,
    },

    /// Link on the wrong side of the bowtie
    SideMismatch {
        /// Declared side of the control
        side: Side,
        /// Link field that must stay empty for that side
        link_field: &'static str,
    },

    /// `notes.schema_version` differs from the pinned version
    SchemaVersion {
        /// Found version
        found: String,
        /// Required version
        required: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::NotStructured => write!(f, "not a structured document"),
            ViolationKind::MissingField => write!(f, "{}: required field missing", self.path),
            ViolationKind::WrongType { expected } => {
                write!(f, "{}: expected {}", self.path, expected)
            }
            ViolationKind::IllegalValue { value, allowed } => write!(
                f,
                "{}: illegal value {} (allowed: {})",
                self.path,
                value,
                allowed.join(", ")
            ),
            ViolationKind::BadIdPattern { value, pattern } => {
                write!(f, "{}: id '{}' does not match {}", self.path, value, pattern)
            }
            ViolationKind::DuplicateId { value } => {
                write!(f, "{}: duplicate id '{}'", self.path, value)
            }
            ViolationKind::DanglingReference { value, namespace } => write!(
                f,
                "{}: references unknown {} id '{}'",
                self.path, namespace, value
            ),
            ViolationKind::SideMismatch { side, link_field } => write!(
                f,
                "{}: {} control must not have {}",
                self.path, side, link_field
            ),
            ViolationKind::SchemaVersion { found, required } => write!(
                f,
                "{}: schema version '{}' (required '{}')",
                self.path, found, required
            ),
        }
    }
}

impl Violation {
    fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        let status = if violations.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        Self { status, violations }
    }

    /// Whether the record passed
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }

    /// Violations rendered as messages
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// The `(ok, violations)` pair
    pub fn into_parts(self) -> (bool, Vec<String>) {
        let ok = self.is_valid();
        (ok, self.messages())
    }
}

/// The Gatekeeper validates records before they are persisted
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate raw text; unparsable input is a single "not a structured document" violation
    pub fn validate_str(&self, raw: &str) -> ValidationResult {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.validate(&value),
            Err(_) => ValidationResult::from_violations(vec![Violation::new(
                "",
                ViolationKind::NotStructured,
            )]),
        }
    }

    /// Validate a typed record (re-serialized, so the same rules apply)
    pub fn validate_record(&self, record: &IncidentRecord) -> ValidationResult {
        match serde_json::to_value(record) {
            Ok(value) => self.validate(&value),
            Err(_) => ValidationResult::from_violations(vec![Violation::new(
                "",
                ViolationKind::NotStructured,
            )]),
        }
    }

    /// Validate a candidate document against the record contract
    ///
    /// # Arguments
    ///
    /// * `candidate` - Parsed JSON as returned by the model
    ///
    /// # Returns
    ///
    /// Accepted with no violations, or Rejected with every violation found
    pub fn validate(&self, candidate: &Value) -> ValidationResult {
        let Some(root) = candidate.as_object() else {
            return ValidationResult::from_violations(vec![Violation::new(
                "",
                ViolationKind::NotStructured,
            )]);
        };

        let mut violations = Vec::new();

        // 1. Identity and required sections
        match root.get("incident_id") {
            None => violations.push(Violation::new("incident_id", ViolationKind::MissingField)),
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(_) => violations.push(Violation::new(
                "incident_id",
                ViolationKind::WrongType {
                    expected: "non-empty string",
                },
            )),
        }
        for section in REQUIRED_SECTIONS {
            object_field(root, section, "", &mut violations);
        }

        // 2. Schema version pin
        if let Some(required) = &self.config.required_schema_version {
            self.check_schema_version(root, required, &mut violations);
        }

        // 3. Bowtie body
        if let Some(bowtie) = root.get("bowtie").and_then(Value::as_object) {
            self.check_bowtie(bowtie, &mut violations);
        }

        // 4. Evidence flags anywhere in the document
        if self.config.validate_mention_types {
            visit_mentions(candidate, |path, value| {
                if !value.is_boolean() {
                    violations.push(Violation::new(
                        path,
                        ViolationKind::WrongType { expected: "boolean" },
                    ));
                }
            });
        }

        ValidationResult::from_violations(violations)
    }

    fn check_schema_version(
        &self,
        root: &Map<String, Value>,
        required: &str,
        violations: &mut Vec<Violation>,
    ) {
        let path = "notes.schema_version";
        match root.get("notes").and_then(|n| n.get("schema_version")) {
            None => violations.push(Violation::new(path, ViolationKind::MissingField)),
            Some(Value::String(found)) if found == required => {}
            Some(other) => violations.push(Violation::new(
                path,
                ViolationKind::SchemaVersion {
                    found: other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                    required: required.to_string(),
                },
            )),
        }
    }

    fn check_bowtie(&self, bowtie: &Map<String, Value>, violations: &mut Vec<Violation>) {
        for list in BOWTIE_LISTS {
            match bowtie.get(*list) {
                None => violations.push(Violation::new(
                    format!("bowtie.{}", list),
                    ViolationKind::MissingField,
                )),
                Some(Value::Array(_)) => {}
                Some(_) => violations.push(Violation::new(
                    format!("bowtie.{}", list),
                    ViolationKind::WrongType { expected: "array" },
                )),
            }
        }

        let hazard_ids = self.collect_ids(bowtie, IdNamespace::Hazard, violations);
        let threat_ids = self.collect_ids(bowtie, IdNamespace::Threat, violations);
        let consequence_ids = self.collect_ids(bowtie, IdNamespace::Consequence, violations);
        // Control ids are checked for pattern and uniqueness like the others
        self.collect_ids(bowtie, IdNamespace::Control, violations);

        let Some(controls) = bowtie.get("controls").and_then(Value::as_array) else {
            return;
        };
        for (idx, control) in controls.iter().enumerate() {
            let path = format!("bowtie.controls[{}]", idx);
            let Some(control) = control.as_object() else {
                continue;
            };
            self.check_control(
                control,
                &path,
                &hazard_ids,
                &threat_ids,
                &consequence_ids,
                violations,
            );
        }
    }

    /// Check one namespace's ids; returns every string id seen
    fn collect_ids(
        &self,
        bowtie: &Map<String, Value>,
        namespace: IdNamespace,
        violations: &mut Vec<Violation>,
    ) -> HashSet<String> {
        let mut seen = HashSet::new();
        let Some(items) = bowtie.get(namespace.list()).and_then(Value::as_array) else {
            return seen;
        };

        for (idx, item) in items.iter().enumerate() {
            let item_path = format!("bowtie.{}[{}]", namespace.list(), idx);
            let Some(obj) = item.as_object() else {
                violations.push(Violation::new(
                    item_path,
                    ViolationKind::WrongType { expected: "object" },
                ));
                continue;
            };

            match obj.get("name") {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => violations.push(Violation::new(
                    format!("{}.name", item_path),
                    ViolationKind::WrongType {
                        expected: "string or null",
                    },
                )),
            }

            let id_path = format!("{}.{}", item_path, namespace.id_field());
            let id = match obj.get(namespace.id_field()) {
                None => {
                    violations.push(Violation::new(id_path, ViolationKind::MissingField));
                    continue;
                }
                Some(Value::String(id)) => id,
                Some(_) => {
                    violations.push(Violation::new(
                        id_path,
                        ViolationKind::WrongType { expected: "string id" },
                    ));
                    continue;
                }
            };

            if self.config.validate_id_patterns && !namespace.matches(id) {
                violations.push(Violation::new(
                    id_path.clone(),
                    ViolationKind::BadIdPattern {
                        value: id.clone(),
                        pattern: namespace.pattern(),
                    },
                ));
            }
            if !seen.insert(id.clone()) && self.config.validate_uniqueness {
                violations.push(Violation::new(
                    id_path,
                    ViolationKind::DuplicateId { value: id.clone() },
                ));
            }
        }

        seen
    }

    fn check_control(
        &self,
        control: &Map<String, Value>,
        path: &str,
        hazard_ids: &HashSet<String>,
        threat_ids: &HashSet<String>,
        consequence_ids: &HashSet<String>,
        violations: &mut Vec<Violation>,
    ) {
        let side = enum_field(control, "side", path, &Side::allowed(), violations)
            .and_then(Side::parse);
        enum_field(control, "barrier_type", path, &BarrierType::allowed(), violations);
        enum_field(control, "line_of_defense", path, &LineOfDefense::allowed(), violations);

        if let Some(performance) = object_field(control, "performance", path, violations) {
            let performance_path = format!("{}.performance", path);
            enum_field(
                performance,
                "barrier_status",
                &performance_path,
                &BarrierStatus::allowed(),
                violations,
            );
        }

        if let Some(evidence) = object_field(control, "evidence", path, violations) {
            let evidence_path = format!("{}.evidence", path);
            enum_field(evidence, "confidence", &evidence_path, &Confidence::allowed(), violations);
            match evidence.get("supporting_text") {
                None => violations.push(Violation::new(
                    format!("{}.supporting_text", evidence_path),
                    ViolationKind::MissingField,
                )),
                Some(Value::String(_)) => {}
                Some(_) => violations.push(Violation::new(
                    format!("{}.supporting_text", evidence_path),
                    ViolationKind::WrongType {
                        expected: "string (verbatim excerpt or empty)",
                    },
                )),
            }
        }

        let links = [
            ("linked_threat_ids", IdNamespace::Threat, threat_ids),
            ("linked_consequence_ids", IdNamespace::Consequence, consequence_ids),
            ("linked_hazard_ids", IdNamespace::Hazard, hazard_ids),
        ];
        for (field, namespace, known) in links {
            let linked = self.check_links(control, field, path, namespace, known, violations);

            if !self.config.validate_side_partition || linked == 0 {
                continue;
            }
            let forbidden = match side {
                Some(Side::Prevention) => field == "linked_consequence_ids",
                Some(Side::Mitigation) => field == "linked_threat_ids",
                None => false,
            };
            if let (true, Some(side)) = (forbidden, side) {
                violations.push(Violation::new(
                    format!("{}.{}", path, field),
                    ViolationKind::SideMismatch {
                        side,
                        link_field: field,
                    },
                ));
            }
        }
    }

    /// Check a link list; returns the number of links present
    fn check_links(
        &self,
        control: &Map<String, Value>,
        field: &'static str,
        path: &str,
        namespace: IdNamespace,
        known: &HashSet<String>,
        violations: &mut Vec<Violation>,
    ) -> usize {
        let field_path = format!("{}.{}", path, field);
        let items = match control.get(field) {
            None | Some(Value::Null) => return 0,
            Some(Value::Array(items)) => items,
            Some(_) => {
                violations.push(Violation::new(
                    field_path,
                    ViolationKind::WrongType {
                        expected: "array of ids",
                    },
                ));
                return 0;
            }
        };

        for (idx, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", field_path, idx);
            match item.as_str() {
                None => violations.push(Violation::new(
                    item_path,
                    ViolationKind::WrongType { expected: "string id" },
                )),
                Some(id) if self.config.validate_references && !known.contains(id) => {
                    violations.push(Violation::new(
                        item_path,
                        ViolationKind::DanglingReference {
                            value: id.to_string(),
                            namespace,
                        },
                    ))
                }
                Some(_) => {}
            }
        }
        items.len()
    }
}

/// Require `key` to be an object; returns it when it is
fn object_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    parent_path: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Map<String, Value>> {
    let path = join_path(parent_path, key);
    match parent.get(key) {
        None => {
            violations.push(Violation::new(path, ViolationKind::MissingField));
            None
        }
        Some(Value::Object(obj)) => Some(obj),
        Some(_) => {
            violations.push(Violation::new(path, ViolationKind::WrongType { expected: "object" }));
            None
        }
    }
}

/// Require `key` to hold one of `allowed`; returns the value when legal
fn enum_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    parent_path: &str,
    allowed: &[&'static str],
    violations: &mut Vec<Violation>,
) -> Option<&'a str> {
    let path = join_path(parent_path, key);
    match parent.get(key) {
        None => {
            violations.push(Violation::new(path, ViolationKind::MissingField));
            None
        }
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => Some(s.as_str()),
        Some(other) => {
            violations.push(Violation::new(
                path,
                ViolationKind::IllegalValue {
                    value: other.to_string(),
                    allowed: allowed.to_vec(),
                },
            ));
            None
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, Just, Strategy};
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "incident_id": "INC-001",
            "event": {"top_event": "Loss of containment", "summary": "Gas release at separator"},
            "bowtie": {
                "top_event": "Loss of containment",
                "hazards": [{"id": "H-001", "name": "Pressurized hydrocarbons"}],
                "threats": [
                    {"threat_id": "T-001", "name": "Internal corrosion"},
                    {"threat_id": "T-002", "name": "Overpressure"}
                ],
                "consequences": [{"id": "CON-001", "name": "Jet fire"}],
                "controls": [
                    {
                        "control_id": "C-001",
                        "name": "Corrosion inspection",
                        "side": "prevention",
                        "barrier_type": "administrative",
                        "line_of_defense": "1st",
                        "linked_threat_ids": ["T-001"],
                        "linked_hazard_ids": ["H-001"],
                        "performance": {"barrier_status": "failed"},
                        "human": {"training_mentioned": false},
                        "evidence": {"supporting_text": "inspection overdue", "confidence": "high"}
                    },
                    {
                        "control_id": "C-002",
                        "name": "Deluge system",
                        "side": "mitigation",
                        "barrier_type": "engineering",
                        "line_of_defense": "recovery",
                        "linked_consequence_ids": ["CON-001"],
                        "performance": {"barrier_status": "active"},
                        "evidence": {"supporting_text": "", "confidence": "low"}
                    }
                ]
            },
            "pifs": {"people": {"fatigue_mentioned": false}},
            "notes": {"schema_version": "2.2"}
        })
    }

    fn messages_for(value: &Value) -> Vec<String> {
        Gatekeeper::default_config().validate(value).messages()
    }

    #[test]
    fn test_valid_record() {
        let result = Gatekeeper::default_config().validate(&valid_record());
        assert_eq!(result.status, ValidationStatus::Accepted);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_not_an_object() {
        let result = Gatekeeper::default_config().validate(&json!([1, 2, 3]));
        assert_eq!(result.messages(), vec!["not a structured document"]);

        let result = Gatekeeper::default_config().validate_str("{ broken");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::NotStructured);
    }

    #[test]
    fn test_missing_sections() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("pifs");
        record.as_object_mut().unwrap().remove("incident_id");
        let messages = messages_for(&record);
        assert!(messages.contains(&"incident_id: required field missing".to_string()));
        assert!(messages.contains(&"pifs: required field missing".to_string()));
    }

    #[test]
    fn test_illegal_enum_names_field_value_and_set() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["side"] = json!("preventive");
        let messages = messages_for(&record);
        assert_eq!(
            messages,
            vec![r#"bowtie.controls[0].side: illegal value "preventive" (allowed: prevention, mitigation)"#]
        );
    }

    #[test]
    fn test_null_enum_is_rejected() {
        let mut record = valid_record();
        record["bowtie"]["controls"][1]["evidence"]["confidence"] = Value::Null;
        let result = Gatekeeper::default_config().validate(&record);
        assert!(!result.is_valid());
        assert_eq!(result.violations[0].path, "bowtie.controls[1].evidence.confidence");
    }

    #[test]
    fn test_bad_id_pattern_and_duplicate() {
        let mut record = valid_record();
        record["bowtie"]["controls"][1]["control_id"] = json!("C-001");
        record["bowtie"]["hazards"][0]["id"] = json!("HZ-1");
        record["bowtie"]["controls"][0]["linked_hazard_ids"] = json!(["HZ-1"]);
        let result = Gatekeeper::default_config().validate(&record);
        let kinds: Vec<_> = result.violations.iter().map(|v| v.kind.clone()).collect();
        assert!(kinds.contains(&ViolationKind::DuplicateId {
            value: "C-001".to_string()
        }));
        assert!(kinds.contains(&ViolationKind::BadIdPattern {
            value: "HZ-1".to_string(),
            pattern: "H-NNN"
        }));
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn test_dangling_reference() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["linked_threat_ids"] = json!(["T-001", "T-009"]);
        let messages = messages_for(&record);
        assert_eq!(
            messages,
            vec!["bowtie.controls[0].linked_threat_ids[1]: references unknown threat id 'T-009'"]
        );
    }

    #[test]
    fn test_side_partition() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["linked_consequence_ids"] = json!(["CON-001"]);
        record["bowtie"]["controls"][1]["linked_threat_ids"] = json!(["T-002"]);
        let result = Gatekeeper::default_config().validate(&record);
        let mismatches = result
            .violations
            .iter()
            .filter(|v| matches!(v.kind, ViolationKind::SideMismatch { .. }))
            .count();
        assert_eq!(mismatches, 2);
    }

    #[test]
    fn test_mention_flags_must_be_boolean() {
        let mut record = valid_record();
        record["pifs"]["people"]["fatigue_mentioned"] = json!("yes");
        let messages = messages_for(&record);
        assert_eq!(messages, vec!["pifs.people.fatigue_mentioned: expected boolean"]);
    }

    #[test]
    fn test_supporting_text_must_be_string() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["evidence"]["supporting_text"] = Value::Null;
        let result = Gatekeeper::default_config().validate(&record);
        assert_eq!(
            result.violations[0].path,
            "bowtie.controls[0].evidence.supporting_text"
        );
    }

    #[test]
    fn test_permissive_config_skips_relations() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["linked_threat_ids"] = json!(["T-999"]);
        record["bowtie"]["controls"][0]["linked_consequence_ids"] = json!(["CON-001"]);
        let gatekeeper = Gatekeeper::new(ValidationConfig::permissive());
        assert!(gatekeeper.validate(&record).is_valid());
    }

    #[test]
    fn test_strict_config_pins_schema_version() {
        let mut record = valid_record();
        record["notes"]["schema_version"] = json!("2.1");
        let gatekeeper = Gatekeeper::new(ValidationConfig::strict());
        let messages = gatekeeper.validate(&record).messages();
        assert_eq!(
            messages,
            vec!["notes.schema_version: schema version '2.1' (required '2.2')"]
        );
    }

    #[test]
    fn test_validate_record_round_trip() {
        let record: IncidentRecord = serde_json::from_value(valid_record()).unwrap();
        assert!(Gatekeeper::default_config().validate_record(&record).is_valid());
    }

    #[test]
    fn test_into_parts() {
        let (ok, violations) = Gatekeeper::default_config().validate(&valid_record()).into_parts();
        assert!(ok);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_stub_response_is_valid() {
        let result = Gatekeeper::new(ValidationConfig::strict()).validate_str(bowtie_llm::STUB_RESPONSE);
        assert!(result.is_valid(), "{:?}", result.messages());
    }

    #[test]
    fn test_name_must_be_string_or_null() {
        let mut record = valid_record();
        record["bowtie"]["hazards"][0]["name"] = Value::Null;
        record["bowtie"]["controls"][1]["name"] = Value::Null;
        assert!(Gatekeeper::default_config().validate(&record).is_valid());

        record["bowtie"]["threats"][1]["name"] = json!(42);
        record["bowtie"]["controls"][0]["name"] = json!(["Corrosion inspection"]);
        let messages = messages_for(&record);
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert!(messages.iter().any(|m| m.starts_with("bowtie.threats[1].name")));
        assert!(messages.iter().any(|m| m.starts_with("bowtie.controls[0].name")));
    }

    #[test]
    fn test_null_links_are_accepted_and_readable() {
        let mut record = valid_record();
        record["bowtie"]["controls"][0]["linked_hazard_ids"] = Value::Null;
        record["bowtie"]["controls"][1]["linked_threat_ids"] = Value::Null;
        assert!(Gatekeeper::default_config().validate(&record).is_valid());
        let typed: IncidentRecord = serde_json::from_value(record).unwrap();
        assert!(typed.bowtie.controls[0].linked_hazard_ids.is_empty());
    }

    /// Object paths and the field injected under them
    const LOOSE_FIELDS: &[(&str, &str)] = &[
        ("/bowtie/hazards/0", "name"),
        ("/bowtie/threats/1", "name"),
        ("/bowtie/consequences/0", "name"),
        ("/bowtie/controls/0", "name"),
        ("/bowtie/controls/0", "linked_threat_ids"),
        ("/bowtie/controls/0", "linked_hazard_ids"),
        ("/bowtie/controls/1", "linked_consequence_ids"),
        ("/bowtie/controls/1", "linked_hazard_ids"),
    ];

    fn any_json() -> impl Strategy<Value = Value> {
        proptest::prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
            "[A-Za-z ]{0,8}".prop_map(Value::String),
            Just(json!([])),
            Just(json!(["H-001"])),
            Just(json!([7])),
            Just(json!({})),
        ]
    }

    proptest::proptest! {
        #[test]
        fn prop_accepted_documents_deserialize(
            injections in proptest::collection::vec((0usize..LOOSE_FIELDS.len(), any_json()), 1..4),
        ) {
            let mut record = valid_record();
            for (idx, value) in injections {
                let (parent, field) = LOOSE_FIELDS[idx];
                if let Some(obj) = record.pointer_mut(parent).and_then(Value::as_object_mut) {
                    obj.insert(field.to_string(), value);
                }
            }

            if Gatekeeper::default_config().validate(&record).is_valid() {
                let typed = serde_json::from_value::<IncidentRecord>(record.clone());
                proptest::prop_assert!(typed.is_ok(), "{:?} for {}", typed.err(), record);
            }
        }
    }

    const ENUM_FIELDS: &[(&str, &[&str])] = &[
        ("side", &["side"]),
        ("barrier_type", &["barrier_type"]),
        ("line_of_defense", &["line_of_defense"]),
        ("barrier_status", &["performance", "barrier_status"]),
        ("confidence", &["evidence", "confidence"]),
    ];

    fn allowed_for(field: &str) -> Vec<&'static str> {
        match field {
            "side" => Side::allowed(),
            "barrier_type" => BarrierType::allowed(),
            "line_of_defense" => LineOfDefense::allowed(),
            "barrier_status" => BarrierStatus::allowed(),
            _ => Confidence::allowed(),
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_injected_enum_values_are_rejected(
            field_idx in 0usize..5,
            control_idx in 0usize..2,
            injected in "[A-Za-z_ ]{0,12}",
        ) {
            let (field, segments) = ENUM_FIELDS[field_idx];
            proptest::prop_assume!(!allowed_for(field).contains(&injected.as_str()));

            let mut record = valid_record();
            let mut target = &mut record["bowtie"]["controls"][control_idx];
            for segment in segments {
                target = &mut target[*segment];
            }
            *target = Value::String(injected.clone());

            let result = Gatekeeper::default_config().validate(&record);
            proptest::prop_assert!(!result.is_valid());
            let named = result.violations.iter().any(|v| {
                v.path.ends_with(field)
                    && matches!(&v.kind, ViolationKind::IllegalValue { value, .. } if value.contains(injected.as_str()))
            });
            proptest::prop_assert!(named, "violations: {:?}", result.messages());
        }
    }
}
