//! Provider settings shared by every backend

use serde::{Deserialize, Serialize};

/// Default completion budget
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings passed to a provider at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model identifier; each vendor falls back to its own default
    pub model: Option<String>,

    /// Upper bound on completion tokens
    pub max_output_tokens: u32,

    /// Sampling temperature (0.0 for repeatable extractions)
    pub temperature: f32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Override for the vendor API base URL
    pub base_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }
}

impl ProviderSettings {
    /// Settings with an explicit model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Settings with a different timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Settings with a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub(crate) fn model_or(&self, default: &str) -> String {
        self.model.clone().unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}
