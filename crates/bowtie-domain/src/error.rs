//! Provider failure taxonomy
//!
//! Every backend normalizes its transport and vendor failures into a
//! [`ProviderError`]. Whether the orchestrator retries is decided solely by
//! [`ProviderError::retryable`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Connection refused, reset, DNS failure
    Transport,
    /// Request exceeded its deadline
    Timeout,
    /// Vendor rate limit (HTTP 429)
    RateLimited,
    /// Vendor-side failure (HTTP 5xx, overloaded)
    Server,
    /// Missing or rejected credentials
    Authentication,
    /// Bad model name, malformed request, unsupported provider
    Configuration,
    /// Response could not be decoded, or was truncated
    InvalidResponse,
}

impl ProviderErrorKind {
    /// Whether a failure of this kind may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Transport
                | ProviderErrorKind::Timeout
                | ProviderErrorKind::RateLimited
                | ProviderErrorKind::Server
        )
    }

    /// Short label used in log lines and manifest messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::Server => "server error",
            ProviderErrorKind::Authentication => "authentication",
            ProviderErrorKind::Configuration => "configuration",
            ProviderErrorKind::InvalidResponse => "invalid response",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized failure from an [`ExtractionProvider`](crate::ExtractionProvider)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    /// Name of the provider that failed
    pub provider: String,
    /// Failure classification
    pub kind: ProviderErrorKind,
    /// Human-readable detail (never contains partial model output)
    pub message: String,
    /// Server-advised wait before retrying, if any
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    /// Create a new provider error
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Attach a server-advised retry delay
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Whether the orchestrator may retry with the same prompt
    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Transient transport failure
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Transport, message)
    }

    /// Rate limit hit
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::RateLimited, message)
    }

    /// Credentials missing or rejected
    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Authentication, message)
    }

    /// Misconfiguration that no retry can fix
    pub fn configuration(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Configuration, message)
    }

    /// Undecodable or truncated response
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::InvalidResponse, message)
    }
}
