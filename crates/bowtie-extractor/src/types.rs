//! Request and result types for extraction runs

use bowtie_domain::ManifestStatus;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Violations kept in a manifest `error_message`
pub const MAX_VIOLATIONS_IN_MESSAGE: usize = 10;

/// Options for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip inputs already `valid` whose output file still exists
    pub resume: bool,

    /// Process at most this many inputs (skipped inputs do not count)
    pub limit: Option<usize>,
}

impl RunOptions {
    /// Resume a previous run
    pub fn resume() -> Self {
        Self {
            resume: true,
            limit: None,
        }
    }

    /// Cap the number of inputs processed
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One input that did not end `valid`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    /// Input text file
    pub source_path: String,

    /// Identifier derived from the filename
    pub incident_id: String,

    /// `invalid` or `error`
    pub status: ManifestStatus,

    /// Same text as the manifest `error_message`
    pub message: String,
}

/// Aggregate result of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Inputs skipped by `resume`
    pub skipped: usize,

    /// Inputs that ended `valid`
    pub valid: usize,

    /// Inputs that ended `invalid`
    pub invalid: usize,

    /// Inputs that ended `error`
    pub error: usize,

    /// Attempts recorded this run (provider calls, or one per input that
    /// failed before reaching the provider)
    pub attempts: u32,

    /// Wall-clock duration
    pub elapsed: Duration,

    /// Stopped early by a shutdown signal
    pub interrupted: bool,

    /// Per-input failure detail
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    /// Whether any input ended `error`
    pub fn has_errors(&self) -> bool {
        self.error > 0
    }

    /// Inputs that reached a terminal status this run
    pub fn processed(&self) -> usize {
        self.valid + self.invalid + self.error
    }
}

/// How one input's processing concluded
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// Record passed validation
    Valid(Value),

    /// Response unparsable or schema violations
    Invalid(Vec<String>),

    /// Provider, read or size failure
    Error(String),
}

impl Outcome {
    pub(crate) fn status(&self) -> ManifestStatus {
        match self {
            Outcome::Valid(_) => ManifestStatus::Valid,
            Outcome::Invalid(_) => ManifestStatus::Invalid,
            Outcome::Error(_) => ManifestStatus::Error,
        }
    }
}

/// Join violations for the manifest, capped at [`MAX_VIOLATIONS_IN_MESSAGE`]
pub(crate) fn summarize_violations(violations: &[String]) -> String {
    let shown = violations
        .iter()
        .take(MAX_VIOLATIONS_IN_MESSAGE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    match violations.len().checked_sub(MAX_VIOLATIONS_IN_MESSAGE) {
        Some(hidden) if hidden > 0 => format!("{} (+{} more)", shown, hidden),
        _ => shown,
    }
}
