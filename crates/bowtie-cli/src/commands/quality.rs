//! Quality command implementation.

use super::Verdict;
use crate::cli::QualityArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use bowtie_quality::{QualityError, QualityGate};
use tracing::warn;

/// Execute the quality command.
pub fn execute_quality(args: QualityArgs, config: &Config, formatter: &Formatter) -> Result<Verdict> {
    let incident_dir = args.incident_dir.unwrap_or_else(|| {
        let provider = args.provider.unwrap_or_else(|| config.provider.name.clone());
        config.paths.out_dir.join(provider)
    });

    let mut thresholds = config.quality.clone();
    if let Some(min_valid_ratio) = args.min_valid_ratio {
        thresholds.min_valid_ratio = min_valid_ratio;
    }
    if let Some(min_coverage) = args.min_coverage {
        thresholds.min_coverage = min_coverage;
    }
    thresholds.validate().map_err(QualityError::Config)?;

    let report = QualityGate::default().compute(&incident_dir)?;
    let failures = report.check(&thresholds);
    for failure in &failures {
        warn!(gate = failure.metric, actual = failure.actual, required = failure.required, "Quality gate failed");
    }

    println!("{}", formatter.quality_report(&report, &failures)?);

    Ok(if failures.is_empty() {
        Verdict::Success
    } else {
        Verdict::GateFailed
    })
}
