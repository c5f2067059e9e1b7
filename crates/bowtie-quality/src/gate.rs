//! Directory scan behind the quality report

use crate::metrics::{QualityReport, Tally};
use crate::QualityError;
use bowtie_domain::IncidentRecord;
use bowtie_gatekeeper::Gatekeeper;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Computes corpus metrics over a directory of extracted records
///
/// Records are re-validated before they count; a file that no longer
/// passes is reported as an anomaly and left out of every other metric.
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    gatekeeper: Gatekeeper,
}

impl QualityGate {
    /// Create a gate that re-validates with `gatekeeper`
    pub fn new(gatekeeper: Gatekeeper) -> Self {
        Self { gatekeeper }
    }

    /// Scan every `*.json` file in `incident_dir`
    ///
    /// The result depends only on the directory contents, never on
    /// file system iteration order or timestamps.
    pub fn compute(&self, incident_dir: &Path) -> Result<QualityReport, QualityError> {
        let mut tally = Tally::default();

        for path in record_files(incident_dir)? {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.inspect(&path) {
                Ok((record, document)) => {
                    debug!(file = %file_name, "Record accepted");
                    tally.record_incident(&record, &document);
                }
                Err(reason) => {
                    warn!(file = %file_name, reason = %reason, "Excluding anomalous record");
                    tally.record_anomaly(file_name);
                }
            }
        }

        let report = tally.finish();
        info!(
            dir = %incident_dir.display(),
            records = report.total_records,
            anomalies = report.anomalies,
            coverage = report.coverage.overall.ratio,
            "Quality report computed"
        );
        Ok(report)
    }

    fn inspect(&self, path: &Path) -> Result<(IncidentRecord, Value), String> {
        let raw = fs::read_to_string(path).map_err(|e| format!("unreadable: {}", e))?;

        let result = self.gatekeeper.validate_str(&raw);
        if !result.is_valid() {
            return Err(result.messages().join("; "));
        }

        let document: Value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
        let record = serde_json::from_value(document.clone()).map_err(|e| e.to_string())?;
        Ok((record, document))
    }
}

/// Sorted `*.json` files directly inside `dir`
fn record_files(dir: &Path) -> Result<Vec<PathBuf>, QualityError> {
    let dir_error = |source| QualityError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
