//! Configuration for the Extractor

use bowtie_domain::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and backoff for retryable provider failures
///
/// The delay before attempt `n + 1` is `base_delay_ms * 2^(n - 1)`, capped at
/// `max_delay_ms`, and never shorter than a server-advised `Retry-After`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Provider calls allowed per input, first call included
    pub max_attempts: u32,

    /// Backoff before the second call (milliseconds)
    pub base_delay_ms: u64,

    /// Backoff ceiling (milliseconds)
    pub max_delay_ms: u64,

    /// Wait at least as long as the provider's `Retry-After`
    pub honor_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            honor_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` calls with no waiting in between (for tests)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
            honor_retry_after: false,
        }
    }

    /// Delay before retrying after failed call number `attempt` (1-based)
    ///
    /// `None` means do not retry: the error is not retryable or the attempts
    /// are used up.
    pub fn delay_for(&self, attempt: u32, error: &ProviderError) -> Option<Duration> {
        if !error.retryable() || attempt >= self.max_attempts {
            return None;
        }

        let exponent = attempt.saturating_sub(1).min(32);
        let backoff_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        let backoff = Duration::from_millis(backoff_ms);

        match error.retry_after {
            Some(advised) if self.honor_retry_after => Some(backoff.max(advised)),
            _ => Some(backoff),
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Concurrent extraction workers (1 = sequential, in input order)
    pub workers: usize,

    /// Retry policy for provider calls
    pub retry: RetryPolicy,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Archive every raw provider response under `raw/<provider>/`
    pub save_raw_responses: bool,

    /// Maximum time for a single provider call (seconds)
    pub provider_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the provider timeout as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be greater than 0".to_string());
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err("retry.base_delay_ms cannot exceed retry.max_delay_ms".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("provider_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Sequential processing with three provider attempts per input
    fn default() -> Self {
        Self {
            workers: 1,
            retry: RetryPolicy::default(),
            max_text_length: 200_000,
            save_raw_responses: true,
            provider_timeout_secs: 120,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: more workers, fewer and shorter retries
    pub fn aggressive() -> Self {
        Self {
            workers: 8,
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay_ms: 500,
                max_delay_ms: 5_000,
                honor_retry_after: true,
            },
            max_text_length: 100_000,
            save_raw_responses: false,
            provider_timeout_secs: 60,
        }
    }

    /// Lenient preset: one worker, patient retries for tight rate limits
    pub fn lenient() -> Self {
        Self {
            workers: 1,
            retry: RetryPolicy {
                max_attempts: 5,
                base_delay_ms: 2_000,
                max_delay_ms: 120_000,
                honor_retry_after: true,
            },
            max_text_length: 400_000,
            save_raw_responses: true,
            provider_timeout_secs: 300,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
