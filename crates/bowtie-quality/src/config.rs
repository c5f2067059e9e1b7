//! Pass/fail gates over a quality report

use serde::{Deserialize, Serialize};

/// Minimum acceptable corpus metrics
///
/// A threshold of `0.0` disables that gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Minimum share of records that pass re-validation
    pub min_valid_ratio: f64,

    /// Minimum overall coverage ratio
    pub min_coverage: f64,
}

impl QualityThresholds {
    /// Strict preset for release corpora
    pub fn strict() -> Self {
        Self {
            min_valid_ratio: 1.0,
            min_coverage: 0.8,
        }
    }

    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("min_valid_ratio", self.min_valid_ratio),
            ("min_coverage", self.min_coverage),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0 (got {})", name, value));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disables_gates() {
        let thresholds = QualityThresholds::default();
        assert_eq!(thresholds.min_valid_ratio, 0.0);
        assert_eq!(thresholds.min_coverage, 0.0);
        assert!(thresholds.validate().is_ok());
        assert!(QualityThresholds::strict().validate().is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let thresholds = QualityThresholds {
            min_valid_ratio: 1.5,
            ..QualityThresholds::default()
        };
        assert!(thresholds.validate().unwrap_err().contains("min_valid_ratio"));

        let thresholds = QualityThresholds {
            min_coverage: -0.1,
            ..QualityThresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
