//! Manifest entries - per-input processing state across runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of one input file
///
/// ```text
/// pending ──► in_progress ──► valid | invalid | error
///                  ▲                    │
///                  └────── re-run ──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    /// Discovered, never attempted
    Pending,
    /// An attempt has started and not yet concluded
    InProgress,
    /// Schema passed, JSON persisted
    Valid,
    /// Response unparsable or schema failed
    Invalid,
    /// Provider, configuration or I/O failure
    Error,
}

impl ManifestStatus {
    /// Every status, in lifecycle order
    pub const ALL: &'static [ManifestStatus] = &[
        ManifestStatus::Pending,
        ManifestStatus::InProgress,
        ManifestStatus::Valid,
        ManifestStatus::Invalid,
        ManifestStatus::Error,
    ];

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestStatus::Pending => "pending",
            ManifestStatus::InProgress => "in_progress",
            ManifestStatus::Valid => "valid",
            ManifestStatus::Invalid => "invalid",
            ManifestStatus::Error => "error",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ManifestStatus::Pending),
            "in_progress" => Some(ManifestStatus::InProgress),
            "valid" => Some(ManifestStatus::Valid),
            "invalid" => Some(ManifestStatus::Invalid),
            "error" => Some(ManifestStatus::Error),
            _ => None,
        }
    }

    /// Whether an attempt has concluded with this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ManifestStatus::Valid | ManifestStatus::Invalid | ManifestStatus::Error
        )
    }
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One manifest row, keyed by `source_path`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path of the input text file (the row key)
    pub source_path: String,

    /// Identifier derived from the filename
    pub incident_id: String,

    /// Persisted JSON path; set only once the record is valid
    pub output_path: Option<String>,

    /// Current status
    pub status: ManifestStatus,

    /// Failure detail for `invalid` and `error`
    pub error_message: Option<String>,

    /// Provider name used for the last attempt
    pub provider: String,

    /// Model identifier used for the last attempt
    pub model: Option<String>,

    /// Provider calls and terminal outcomes recorded so far
    pub attempt_count: u32,

    /// When the last attempt concluded or started
    pub last_attempt_at: Option<DateTime<Utc>>,

    /// Status held before the entry went `in_progress`
    pub prior_status: Option<ManifestStatus>,
}

impl ManifestEntry {
    /// A freshly discovered input
    pub fn pending(
        source_path: impl Into<String>,
        incident_id: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            incident_id: incident_id.into(),
            output_path: None,
            status: ManifestStatus::Pending,
            error_message: None,
            provider: provider.into(),
            model: None,
            attempt_count: 0,
            last_attempt_at: None,
            prior_status: None,
        }
    }

    /// Move to `in_progress`, remembering the status to restore on interruption
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) {
        if self.status != ManifestStatus::InProgress {
            self.prior_status = Some(self.status);
        }
        self.status = ManifestStatus::InProgress;
        self.last_attempt_at = Some(now);
    }

    /// Undo an interrupted attempt: back to the prior terminal status, or `pending`
    pub fn revert_attempt(&mut self) {
        if self.status != ManifestStatus::InProgress {
            return;
        }
        self.status = match self.prior_status.take() {
            Some(status) if status.is_terminal() => status,
            _ => ManifestStatus::Pending,
        };
    }

    /// Whether this entry is terminal
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
