//! OpenAI chat completions provider

use crate::http::{block_on, build_client, post_json};
use crate::ProviderSettings;
use bowtie_domain::{ExtractionProvider, ProviderError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Default OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

const NAME: &str = "openai";

/// OpenAI provider
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider with an explicit API key
    pub fn new(api_key: impl Into<String>, settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: settings.base_url_or(DEFAULT_ENDPOINT),
            model: settings.model_or(DEFAULT_MODEL),
            api_key: api_key.into(),
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            client: build_client(NAME, settings)?,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_output_tokens,
        })
    }

    /// Run one completion
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let response: ChatResponse = post_json(NAME, request, &self.request_body(prompt)).await?;
        completion_text(response)
    }
}

fn completion_text(response: ChatResponse) -> Result<String, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::invalid_response(NAME, "response has no choices"))?;

    if choice.finish_reason.as_deref() == Some("length") {
        return Err(ProviderError::invalid_response(
            NAME,
            "completion truncated at max_output_tokens",
        ));
    }

    choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::invalid_response(NAME, "empty completion"))
}

impl ExtractionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "openai request");
        block_on(NAME, self.complete(prompt))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bowtie_domain::ProviderErrorKind;

    fn parse(body: &str) -> Result<String, ProviderError> {
        completion_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("sk-test", &ProviderSettings::default()).unwrap();
        assert_eq!(provider.model(), Some(DEFAULT_MODEL));
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);

        let body = provider.request_body("hello");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 4096);
    }

    #[test]
    fn test_completion_text() {
        let text = parse(r#"{"choices":[{"message":{"content":"{\"a\":1}"},"finish_reason":"stop"}]}"#);
        assert_eq!(text.unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_truncated_completion_is_error() {
        let err = parse(r#"{"choices":[{"message":{"content":"{\"a\":"},"finish_reason":"length"}]}"#)
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidResponse);
        assert!(!err.retryable());
    }

    #[test]
    fn test_missing_choices_is_error() {
        assert!(parse(r#"{"choices":[]}"#).is_err());
        assert!(parse(r#"{"choices":[{"message":{"content":null},"finish_reason":"stop"}]}"#).is_err());
    }

    #[test]
    fn test_unreachable_endpoint_is_retryable() {
        let settings = ProviderSettings::default()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout_secs(5);
        let provider = OpenAiProvider::new("sk-test", &settings).unwrap();
        let err = provider.extract("test").unwrap_err();
        assert!(err.retryable(), "{:?}", err);
    }
}
