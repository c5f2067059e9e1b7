//! Shared HTTP plumbing for vendor providers

use crate::ProviderSettings;
use bowtie_domain::{ProviderError, ProviderErrorKind};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Longest slice of an error body kept in messages
const MAX_BODY_IN_MESSAGE: usize = 200;

/// Build an async client honoring the configured timeout
pub(crate) fn build_client(
    provider: &str,
    settings: &ProviderSettings,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| ProviderError::configuration(provider, format!("cannot build HTTP client: {}", e)))
}

/// Run an async request from synchronous code
///
/// Must be called from a blocking context (a `spawn_blocking` task or a plain
/// thread). Outside any runtime a throwaway current-thread runtime is used.
pub(crate) fn block_on<F: Future>(provider: &str, fut: F) -> Result<F::Output, ProviderError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(fut)),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| ProviderError::transport(provider, format!("cannot start runtime: {}", e)))?;
            Ok(runtime.block_on(fut))
        }
    }
}

/// POST a JSON body and decode a JSON response, mapping every failure
pub(crate) async fn post_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<T, ProviderError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| classify_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await.unwrap_or_default();
        return Err(classify_status(provider, status, retry_after, &text));
    }

    let text = response
        .text()
        .await
        .map_err(|e| classify_transport(provider, &e))?;
    serde_json::from_str(&text).map_err(|e| {
        ProviderError::invalid_response(provider, format!("undecodable response body: {}", e))
    })
}

/// Map a non-success HTTP status to an error kind
pub(crate) fn classify_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> ProviderError {
    let kind = match status.as_u16() {
        429 => ProviderErrorKind::RateLimited,
        401 | 403 => ProviderErrorKind::Authentication,
        408 => ProviderErrorKind::Timeout,
        500..=599 => ProviderErrorKind::Server,
        _ => ProviderErrorKind::Configuration,
    };
    let message = format!("HTTP {}: {}", status.as_u16(), excerpt(body));
    let error = ProviderError::new(provider, kind, message);
    match retry_after {
        Some(delay) if kind.is_retryable() => error.with_retry_after(delay),
        _ => error,
    }
}

/// Map a reqwest failure that produced no status
pub(crate) fn classify_transport(provider: &str, error: &reqwest::Error) -> ProviderError {
    let kind = if error.is_timeout() {
        ProviderErrorKind::Timeout
    } else if error.is_decode() {
        ProviderErrorKind::InvalidResponse
    } else if error.is_builder() {
        ProviderErrorKind::Configuration
    } else {
        ProviderErrorKind::Transport
    };
    ProviderError::new(provider, kind, error.to_string())
}

/// `Retry-After` in delta-seconds form
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

/// Read a required environment variable, failing as an authentication error
pub(crate) fn require_key<F>(provider: &str, var: &str, env: F) -> Result<String, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    env(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::authentication(
                provider,
                format!("provider '{}' requires env var {} but it is not set", provider, var),
            )
        })
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    if body.len() <= MAX_BODY_IN_MESSAGE {
        return body;
    }
    let mut end = MAX_BODY_IN_MESSAGE;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, RETRY_AFTER};

    #[test]
    fn test_status_classification() {
        let cases = [
            (429, ProviderErrorKind::RateLimited, true),
            (500, ProviderErrorKind::Server, true),
            (502, ProviderErrorKind::Server, true),
            (503, ProviderErrorKind::Server, true),
            (504, ProviderErrorKind::Server, true),
            (529, ProviderErrorKind::Server, true),
            (401, ProviderErrorKind::Authentication, false),
            (403, ProviderErrorKind::Authentication, false),
            (400, ProviderErrorKind::Configuration, false),
            (404, ProviderErrorKind::Configuration, false),
        ];
        for (code, kind, retryable) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            let err = classify_status("openai", status, None, "{}");
            assert_eq!(err.kind, kind, "status {}", code);
            assert_eq!(err.retryable(), retryable, "status {}", code);
        }
    }

    #[test]
    fn test_retry_after_only_kept_for_retryable() {
        let delay = Some(Duration::from_secs(7));
        let limited = classify_status("anthropic", StatusCode::TOO_MANY_REQUESTS, delay, "");
        assert_eq!(limited.retry_after, delay);

        let denied = classify_status("anthropic", StatusCode::UNAUTHORIZED, delay, "");
        assert_eq!(denied.retry_after, None);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 2.5 "));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(2500)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "é".repeat(300);
        let err = classify_status("gemini", StatusCode::BAD_REQUEST, None, &body);
        assert!(err.message.len() < 260);
    }

    #[test]
    fn test_require_key() {
        let missing = require_key("openai", "OPENAI_API_KEY", |_| None).unwrap_err();
        assert_eq!(missing.kind, ProviderErrorKind::Authentication);
        assert!(missing.message.contains("OPENAI_API_KEY"));

        let blank = require_key("openai", "OPENAI_API_KEY", |_| Some("  ".to_string()));
        assert!(blank.is_err());

        let key = require_key("openai", "OPENAI_API_KEY", |_| Some("sk-test".to_string()));
        assert_eq!(key.unwrap(), "sk-test");
    }

    #[test]
    fn test_block_on_outside_runtime() {
        let value = block_on("stub", async { 41 + 1 }).unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_block_on_from_blocking_task() {
        let value = tokio::task::spawn_blocking(|| block_on("stub", async { "ok" }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, "ok");
    }
}
