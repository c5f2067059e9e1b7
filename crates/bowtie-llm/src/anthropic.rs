//! Anthropic messages provider

use crate::http::{block_on, build_client, post_json};
use crate::ProviderSettings;
use bowtie_domain::{ExtractionProvider, ProviderError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const API_VERSION: &str = "2023-06-01";
const NAME: &str = "anthropic";

/// Anthropic provider
pub struct AnthropicProvider {
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
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
            "max_tokens": self.max_output_tokens,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        })
    }

    /// Run one completion
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);
        let response: MessagesResponse = post_json(NAME, request, &self.request_body(prompt)).await?;
        completion_text(response)
    }
}

fn completion_text(response: MessagesResponse) -> Result<String, ProviderError> {
    if response.stop_reason.as_deref() == Some("max_tokens") {
        return Err(ProviderError::invalid_response(
            NAME,
            "completion truncated at max_output_tokens",
        ));
    }

    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::invalid_response(NAME, "empty completion"));
    }
    Ok(text)
}

impl ExtractionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "anthropic request");
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
        let settings = ProviderSettings::default().with_model("claude-haiku");
        let provider = AnthropicProvider::new("key", &settings).unwrap();
        assert_eq!(provider.model(), Some("claude-haiku"));
        assert_eq!(provider.request_body("x")["max_tokens"], 4096);
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let text = parse(
            r#"{"content":[{"type":"text","text":"{\"a\":"},{"type":"text","text":"1}"}],"stop_reason":"end_turn"}"#,
        );
        assert_eq!(text.unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_max_tokens_stop_is_error() {
        let err = parse(r#"{"content":[{"type":"text","text":"{"}],"stop_reason":"max_tokens"}"#)
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidResponse);
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(parse(r#"{"content":[],"stop_reason":"end_turn"}"#).is_err());
    }
}
