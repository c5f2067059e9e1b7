//! Corpus metrics accumulated over validated incident records

use crate::config::QualityThresholds;
use crate::QualityError;
use bowtie_domain::mentions::visit_mentions;
use bowtie_domain::{BarrierType, Confidence, Control, IncidentRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A count out of a total, with the ratio rounded to four decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    /// Items meeting the condition
    pub hits: usize,
    /// Items considered
    pub total: usize,
    /// `hits / total`, or `0.0` for an empty total
    pub ratio: f64,
}

impl Ratio {
    fn new(hits: usize, total: usize) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            round4(hits as f64 / total as f64)
        };
        Self { hits, total, ratio }
    }
}

/// Evidence confidence for the controls of one barrier type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    /// Controls of this type
    pub controls: usize,
    /// Mean of `Confidence::score` (high = 1.0, medium = 0.5, low = 0.0)
    pub mean: f64,
    /// Most frequent level; ties go to the higher level
    pub mode: Option<String>,
    /// Controls per level
    pub counts: BTreeMap<String, usize>,
}

/// Share of Bowtie elements with at least one linked control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    /// Hazards referenced by some `linked_hazard_ids`
    pub hazards: Ratio,
    /// Threats referenced by some `linked_threat_ids`
    pub threats: Ratio,
    /// Consequences referenced by some `linked_consequence_ids`
    pub consequences: Ratio,
    /// All three pooled
    pub overall: Ratio,
}

/// Share of `*_mentioned` flags that are `true`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionStats {
    /// Every flag in every record
    pub overall: Ratio,
    /// Grouped by the object holding the flag (`pifs.people`, `bowtie.controls.human`, ...)
    pub by_section: BTreeMap<String, Ratio>,
    /// Flags inside controls, grouped by the control's barrier type
    pub by_barrier_type: BTreeMap<String, Ratio>,
}

/// Aggregate quality metrics for one incident directory
///
/// Every map is ordered, so serializing the same report always produces the
/// same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Records that passed re-validation
    pub total_records: usize,
    /// Files excluded because they failed to read, parse or validate
    pub anomalies: usize,
    /// Names of the excluded files, sorted
    pub anomaly_files: Vec<String>,
    /// `total_records / (total_records + anomalies)`
    pub valid_ratio: f64,
    /// Confidence per barrier type
    pub confidence: BTreeMap<String, ConfidenceStats>,
    /// Link coverage
    pub coverage: Coverage,
    /// Mention rates
    pub mentions: MentionStats,
}

/// A threshold the report did not meet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateFailure {
    /// Metric name
    pub metric: &'static str,
    /// Observed value
    pub actual: f64,
    /// Required minimum
    pub required: f64,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.4} is below {:.4}", self.metric, self.actual, self.required)
    }
}

impl QualityReport {
    /// Pretty JSON, stable across runs over an unchanged directory
    pub fn to_json(&self) -> Result<String, QualityError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Gates this report fails; empty when all pass
    pub fn check(&self, thresholds: &QualityThresholds) -> Vec<GateFailure> {
        let mut failures = Vec::new();
        if self.valid_ratio < thresholds.min_valid_ratio {
            failures.push(GateFailure {
                metric: "valid_ratio",
                actual: self.valid_ratio,
                required: thresholds.min_valid_ratio,
            });
        }
        if self.coverage.overall.ratio < thresholds.min_coverage {
            failures.push(GateFailure {
                metric: "coverage",
                actual: self.coverage.overall.ratio,
                required: thresholds.min_coverage,
            });
        }
        failures
    }
}

/// Running counts while a directory is scanned
#[derive(Debug, Default)]
pub(crate) struct Tally {
    records: usize,
    anomaly_files: Vec<String>,
    confidence: BTreeMap<BarrierType, BTreeMap<Confidence, usize>>,
    hazards: (usize, usize),
    threats: (usize, usize),
    consequences: (usize, usize),
    mentions: (usize, usize),
    by_section: BTreeMap<String, (usize, usize)>,
    by_barrier_type: BTreeMap<BarrierType, (usize, usize)>,
}

impl Tally {
    /// Add a validated record; `document` is the same record as raw JSON
    pub(crate) fn record_incident(&mut self, record: &IncidentRecord, document: &Value) {
        self.records += 1;
        let bowtie = &record.bowtie;

        for control in &bowtie.controls {
            *self
                .confidence
                .entry(control.barrier_type)
                .or_default()
                .entry(control.evidence.confidence)
                .or_insert(0) += 1;
        }

        let hazard_links = linked_ids(&bowtie.controls, |c| &c.linked_hazard_ids);
        let threat_links = linked_ids(&bowtie.controls, |c| &c.linked_threat_ids);
        let consequence_links = linked_ids(&bowtie.controls, |c| &c.linked_consequence_ids);

        add(
            &mut self.hazards,
            bowtie.hazards.iter().filter(|h| hazard_links.contains(h.id.as_str())).count(),
            bowtie.hazards.len(),
        );
        add(
            &mut self.threats,
            bowtie.threats.iter().filter(|t| threat_links.contains(t.threat_id.as_str())).count(),
            bowtie.threats.len(),
        );
        add(
            &mut self.consequences,
            bowtie
                .consequences
                .iter()
                .filter(|c| consequence_links.contains(c.id.as_str()))
                .count(),
            bowtie.consequences.len(),
        );

        visit_mentions(document, |path, value| {
            if let Some(flag) = value.as_bool() {
                add(&mut self.mentions, usize::from(flag), 1);
                add(self.by_section.entry(section_of(path)).or_default(), usize::from(flag), 1);
            }
        });

        let raw_controls = document
            .pointer("/bowtie/controls")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (control, raw) in bowtie.controls.iter().zip(raw_controls) {
            let counts = self.by_barrier_type.entry(control.barrier_type).or_default();
            visit_mentions(raw, |_, value| {
                if let Some(flag) = value.as_bool() {
                    add(counts, usize::from(flag), 1);
                }
            });
        }
    }

    /// Count a file excluded from the metrics
    pub(crate) fn record_anomaly(&mut self, file_name: String) {
        self.anomaly_files.push(file_name);
    }

    pub(crate) fn finish(mut self) -> QualityReport {
        self.anomaly_files.sort();
        let anomalies = self.anomaly_files.len();

        let confidence = BarrierType::ALL
            .iter()
            .map(|barrier_type| {
                let counts = self.confidence.remove(barrier_type).unwrap_or_default();
                (barrier_type.as_str().to_string(), confidence_stats(&counts))
            })
            .collect();

        let pooled = (
            self.hazards.0 + self.threats.0 + self.consequences.0,
            self.hazards.1 + self.threats.1 + self.consequences.1,
        );

        QualityReport {
            total_records: self.records,
            anomalies,
            anomaly_files: self.anomaly_files,
            valid_ratio: Ratio::new(self.records, self.records + anomalies).ratio,
            confidence,
            coverage: Coverage {
                hazards: to_ratio(self.hazards),
                threats: to_ratio(self.threats),
                consequences: to_ratio(self.consequences),
                overall: to_ratio(pooled),
            },
            mentions: MentionStats {
                overall: to_ratio(self.mentions),
                by_section: self
                    .by_section
                    .into_iter()
                    .map(|(section, counts)| (section, to_ratio(counts)))
                    .collect(),
                by_barrier_type: self
                    .by_barrier_type
                    .into_iter()
                    .map(|(barrier_type, counts)| (barrier_type.as_str().to_string(), to_ratio(counts)))
                    .collect(),
            },
        }
    }
}

fn confidence_stats(counts: &BTreeMap<Confidence, usize>) -> ConfidenceStats {
    let controls: usize = counts.values().sum();
    let score: f64 = counts.iter().map(|(level, n)| level.score() * *n as f64).sum();

    // Confidence::ALL runs high to low, so strict `>` keeps the higher level on ties
    let mut mode: Option<(Confidence, usize)> = None;
    for level in Confidence::ALL {
        let n = counts.get(level).copied().unwrap_or(0);
        if n > 0 && mode.map_or(true, |(_, best)| n > best) {
            mode = Some((*level, n));
        }
    }

    ConfidenceStats {
        controls,
        mean: if controls == 0 {
            0.0
        } else {
            round4(score / controls as f64)
        },
        mode: mode.map(|(level, _)| level.as_str().to_string()),
        counts: Confidence::ALL
            .iter()
            .map(|level| (level.as_str().to_string(), counts.get(level).copied().unwrap_or(0)))
            .collect(),
    }
}

/// Every id referenced through one link field
fn linked_ids<'a, F>(controls: &'a [Control], ids: F) -> BTreeSet<&'a str>
where
    F: Fn(&'a Control) -> &'a Vec<String>,
{
    controls
        .iter()
        .flat_map(|c| ids(c).iter().map(String::as_str))
        .collect()
}

/// Parent object of a flag with array indices removed
fn section_of(path: &str) -> String {
    let mut section = String::with_capacity(path.len());
    let mut in_index = false;
    for c in path.chars() {
        match c {
            '[' => in_index = true,
            ']' => in_index = false,
            _ if !in_index => section.push(c),
            _ => {}
        }
    }
    match section.rsplit_once('.') {
        Some((parent, _)) => parent.to_string(),
        None => "(root)".to_string(),
    }
}

fn add(counts: &mut (usize, usize), hits: usize, total: usize) {
    counts.0 += hits;
    counts.1 += total;
}

fn to_ratio((hits, total): (usize, usize)) -> Ratio {
    Ratio::new(hits, total)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(Confidence, usize)]) -> BTreeMap<Confidence, usize> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_ratio_rounding_and_empty_total() {
        assert_eq!(Ratio::new(1, 3).ratio, 0.3333);
        assert_eq!(Ratio::new(2, 3).ratio, 0.6667);
        assert_eq!(Ratio::new(0, 0).ratio, 0.0);
    }

    #[test]
    fn test_confidence_mean_and_mode() {
        let stats = confidence_stats(&counts(&[(Confidence::High, 1), (Confidence::Low, 3)]));
        assert_eq!(stats.controls, 4);
        assert_eq!(stats.mean, 0.25);
        assert_eq!(stats.mode.as_deref(), Some("low"));
        assert_eq!(stats.counts["medium"], 0);
    }

    #[test]
    fn test_mode_tie_prefers_higher_level() {
        let stats = confidence_stats(&counts(&[(Confidence::Medium, 2), (Confidence::Low, 2)]));
        assert_eq!(stats.mode.as_deref(), Some("medium"));

        let stats = confidence_stats(&counts(&[(Confidence::High, 1), (Confidence::Low, 1)]));
        assert_eq!(stats.mode.as_deref(), Some("high"));
    }

    #[test]
    fn test_no_controls_has_no_mode() {
        let stats = confidence_stats(&BTreeMap::new());
        assert_eq!(stats.mean, 0.0);
        assert!(stats.mode.is_none());
        assert_eq!(stats.counts.len(), 3);
    }

    #[test]
    fn test_section_of_strips_indices() {
        assert_eq!(section_of("bowtie.controls[3].human.training_mentioned"), "bowtie.controls.human");
        assert_eq!(section_of("pifs.people.fatigue_mentioned"), "pifs.people");
        assert_eq!(section_of("fatigue_mentioned"), "(root)");
    }

    #[test]
    fn test_check_reports_failed_gates() {
        let report = QualityReport {
            valid_ratio: 0.5,
            coverage: Coverage {
                overall: Ratio::new(9, 10),
                ..Coverage::default()
            },
            ..QualityReport::default()
        };

        assert!(report.check(&QualityThresholds::default()).is_empty());

        let failures = report.check(&QualityThresholds {
            min_valid_ratio: 0.9,
            min_coverage: 0.95,
        });
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].to_string(), "valid_ratio 0.5000 is below 0.9000");
        assert_eq!(failures[1].metric, "coverage");
    }
}
