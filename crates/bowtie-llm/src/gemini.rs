//! Google Gemini generateContent provider

use crate::http::{block_on, build_client, post_json};
use crate::ProviderSettings;
use bowtie_domain::{ExtractionProvider, ProviderError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Default Gemini API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const NAME: &str = "gemini";

/// Gemini provider
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiProvider {
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
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
                "responseMimeType": "application/json",
            },
        })
    }

    /// Run one completion
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        let request = self.client.post(&url).header("x-goog-api-key", &self.api_key);
        let response: GenerateResponse = post_json(NAME, request, &self.request_body(prompt)).await?;
        completion_text(response)
    }
}

fn completion_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::invalid_response(NAME, "response has no candidates"))?;

    match candidate.finish_reason.as_deref() {
        Some("MAX_TOKENS") => {
            return Err(ProviderError::invalid_response(
                NAME,
                "completion truncated at max_output_tokens",
            ))
        }
        Some("SAFETY") | Some("RECITATION") => {
            return Err(ProviderError::invalid_response(NAME, "completion blocked by the vendor"))
        }
        _ => {}
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProviderError::invalid_response(NAME, "empty completion"));
    }
    Ok(text)
}

impl ExtractionProvider for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "gemini request");
        block_on(NAME, self.complete(prompt))?
    }
}
