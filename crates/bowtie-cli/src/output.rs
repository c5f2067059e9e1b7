//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use bowtie_domain::{ManifestEntry, ManifestStatus};
use bowtie_extractor::RunSummary;
use bowtie_quality::{GateFailure, QualityReport};
use colored::*;
use serde_json::json;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest message shown in a table cell
const MESSAGE_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of an extraction run.
    pub fn run_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "valid": summary.valid,
                "invalid": summary.invalid,
                "error": summary.error,
                "skipped": summary.skipped,
                "attempts": summary.attempts,
                "elapsed_secs": summary.elapsed.as_secs_f64(),
                "interrupted": summary.interrupted,
                "failures": summary.failures,
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Valid", "Invalid", "Error", "Skipped", "Attempts", "Elapsed"]);
                builder.push_record([
                    summary.valid.to_string(),
                    summary.invalid.to_string(),
                    summary.error.to_string(),
                    summary.skipped.to_string(),
                    summary.attempts.to_string(),
                    format!("{:.1}s", summary.elapsed.as_secs_f64()),
                ]);
                let mut lines = vec![self.table(builder)];

                if !summary.failures.is_empty() {
                    let mut builder = Builder::default();
                    builder.push_record(["Incident", "Status", "Message"]);
                    for failure in &summary.failures {
                        builder.push_record([
                            failure.incident_id.clone(),
                            self.status(failure.status),
                            truncate(&failure.message),
                        ]);
                    }
                    lines.push(self.table(builder));
                }

                if summary.interrupted {
                    lines.push(self.warning("Run interrupted; re-run with --resume to continue"));
                } else if summary.has_errors() {
                    lines.push(self.error(&format!("{} input(s) ended in error", summary.error)));
                } else {
                    lines.push(self.success(&format!("{} input(s) processed", summary.processed())));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a quality report and the gates it failed.
    pub fn quality_report(&self, report: &QualityReport, failures: &[GateFailure]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "report": report,
                "failed_gates": failures,
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                builder.push_record(["Records".to_string(), report.total_records.to_string()]);
                builder.push_record(["Anomalies".to_string(), report.anomalies.to_string()]);
                builder.push_record(["Valid ratio".to_string(), format!("{:.4}", report.valid_ratio)]);
                for (label, ratio) in [
                    ("Hazard coverage", &report.coverage.hazards),
                    ("Threat coverage", &report.coverage.threats),
                    ("Consequence coverage", &report.coverage.consequences),
                    ("Overall coverage", &report.coverage.overall),
                    ("Mention rate", &report.mentions.overall),
                ] {
                    builder.push_record([
                        label.to_string(),
                        format!("{:.4} ({}/{})", ratio.ratio, ratio.hits, ratio.total),
                    ]);
                }
                let mut lines = vec![self.table(builder)];

                let mut builder = Builder::default();
                builder.push_record(["Barrier type", "Controls", "Mean confidence", "Mode"]);
                for (barrier_type, stats) in &report.confidence {
                    builder.push_record([
                        barrier_type.clone(),
                        stats.controls.to_string(),
                        format!("{:.4}", stats.mean),
                        stats.mode.clone().unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                lines.push(self.table(builder));

                if !report.anomaly_files.is_empty() {
                    lines.push(self.warning(&format!("Anomalies: {}", report.anomaly_files.join(", "))));
                }
                if failures.is_empty() {
                    lines.push(self.success("All quality gates passed"));
                } else {
                    for failure in failures {
                        lines.push(self.error(&format!("Gate failed: {}", failure)));
                    }
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format manifest counts and the rows that did not succeed.
    pub fn manifest_status(
        &self,
        counts: &BTreeMap<ManifestStatus, usize>,
        failing: &[&ManifestEntry],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let counts: BTreeMap<&str, usize> = counts.iter().map(|(s, n)| (s.as_str(), *n)).collect();
                Ok(serde_json::to_string_pretty(&json!({
                    "counts": counts,
                    "failing": failing,
                }))?)
            }
            OutputFormat::Table => {
                let total: usize = counts.values().sum();
                if total == 0 {
                    return Ok(self.warning("Manifest is empty."));
                }

                let mut builder = Builder::default();
                builder.push_record(["Status", "Count"]);
                for (status, count) in counts {
                    builder.push_record([self.status(*status), count.to_string()]);
                }
                builder.push_record(["total".to_string(), total.to_string()]);
                let mut lines = vec![self.table(builder)];

                if !failing.is_empty() {
                    let mut builder = Builder::default();
                    builder.push_record(["Incident", "Status", "Attempts", "Message"]);
                    for entry in failing {
                        builder.push_record([
                            entry.incident_id.clone(),
                            self.status(entry.status),
                            entry.attempt_count.to_string(),
                            truncate(entry.error_message.as_deref().unwrap_or("")),
                        ]);
                    }
                    lines.push(self.table(builder));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn status(&self, status: ManifestStatus) -> String {
        let color = match status {
            ManifestStatus::Valid => "green",
            ManifestStatus::Invalid => "yellow",
            ManifestStatus::Error => "red",
            ManifestStatus::InProgress => "cyan",
            ManifestStatus::Pending => "",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MESSAGE_WIDTH {
        return message.to_string();
    }
    let cut: String = message.chars().take(MESSAGE_WIDTH - 1).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bowtie_extractor::RunFailure;
    use std::time::Duration;

    fn summary() -> RunSummary {
        RunSummary {
            valid: 2,
            invalid: 1,
            attempts: 4,
            elapsed: Duration::from_millis(1500),
            failures: vec![RunFailure {
                source_path: "data/text/INC-2.txt".to_string(),
                incident_id: "INC-2".to_string(),
                status: ManifestStatus::Invalid,
                message: "bowtie.controls[0].side: illegal value \"preventive\"".to_string(),
            }],
            ..RunSummary::default()
        }
    }

    #[test]
    fn test_run_summary_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.run_summary(&summary()).unwrap();
        assert!(output.contains("Valid"));
        assert!(output.contains("INC-2"));
        assert!(output.contains("1.5s"));
        assert!(output.contains("✓ 3 input(s) processed"));
    }

    #[test]
    fn test_run_summary_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.run_summary(&summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["valid"], 2);
        assert_eq!(value["failures"][0]["status"], "invalid");
        assert_eq!(value["interrupted"], false);
    }

    #[test]
    fn test_quality_report_table_lists_failed_gates() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let failure = GateFailure {
            metric: "coverage",
            actual: 0.5,
            required: 0.8,
        };
        let output = formatter
            .quality_report(&QualityReport::default(), &[failure])
            .unwrap();
        assert!(output.contains("Overall coverage"));
        assert!(output.contains("✗ Gate failed: coverage 0.5000 is below 0.8000"));
    }

    #[test]
    fn test_empty_manifest() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let counts: BTreeMap<ManifestStatus, usize> =
            ManifestStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let output = formatter.manifest_status(&counts, &[]).unwrap();
        assert!(output.contains("Manifest is empty"));
    }

    #[test]
    fn test_manifest_status_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let mut entry = ManifestEntry::pending("data/text/INC-9.txt", "INC-9", "stub");
        entry.status = ManifestStatus::Error;
        entry.error_message = Some("stub transport: reset".to_string());
        let counts = BTreeMap::from([(ManifestStatus::Error, 1)]);

        let output = formatter.manifest_status(&counts, &[&entry]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["counts"]["error"], 1);
        assert_eq!(value["failing"][0]["incident_id"], "INC-9");
    }

    #[test]
    fn test_truncate_long_messages() {
        let long = "x".repeat(200);
        assert_eq!(truncate(&long).chars().count(), MESSAGE_WIDTH);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
