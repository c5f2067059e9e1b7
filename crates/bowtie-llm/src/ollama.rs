//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API, for running extraction
//! on local models without credentials.
//!
//! # Examples
//!
//! ```no_run
//! use bowtie_domain::ExtractionProvider;
//! use bowtie_llm::{OllamaProvider, ProviderSettings};
//!
//! let settings = ProviderSettings::default().with_model("llama3.1");
//! let provider = OllamaProvider::new("http://localhost:11434", &settings).unwrap();
//!
//! // `extract` blocks; call it from a blocking task inside async code
//! let raw = provider.extract("Extract the bowtie...").unwrap();
//! ```

use crate::http::{block_on, build_client, post_json};
use crate::ProviderSettings;
use bowtie_domain::{ExtractionProvider, ProviderError};
use serde::{Deserialize, Serialize};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Environment variable overriding the endpoint
pub const HOST_VAR: &str = "OLLAMA_HOST";

const NAME: &str = "ollama";

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    options: OllamaOptions,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: &'a OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `settings`: Model, token budget, temperature and timeout
    pub fn new(endpoint: impl Into<String>, settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let endpoint: String = endpoint.into();
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: settings.model_or(DEFAULT_MODEL),
            options: OllamaOptions {
                temperature: settings.temperature,
                num_predict: settings.max_output_tokens,
            },
            client: build_client(NAME, settings)?,
        })
    }

    /// Create a new Ollama provider on the default local endpoint
    pub fn default_endpoint(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(settings.base_url_or(DEFAULT_ENDPOINT), settings)
    }

    /// Generate text using Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running (retryable transport error)
    /// - Model is not available (configuration error)
    /// - Response format is invalid or truncated
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: &self.options,
        };
        let body = serde_json::to_value(&request_body)
            .map_err(|e| ProviderError::configuration(NAME, e.to_string()))?;

        let response: OllamaGenerateResponse =
            post_json(NAME, self.client.post(&url), &body).await?;
        completion_text(response)
    }
}

fn completion_text(response: OllamaGenerateResponse) -> Result<String, ProviderError> {
    if !response.done || response.done_reason.as_deref() == Some("length") {
        return Err(ProviderError::invalid_response(
            NAME,
            "completion truncated at max_output_tokens",
        ));
    }
    if response.response.trim().is_empty() {
        return Err(ProviderError::invalid_response(NAME, "empty completion"));
    }
    Ok(response.response)
}

impl ExtractionProvider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "ollama request");
        block_on(NAME, self.generate(prompt))?
    }
}
