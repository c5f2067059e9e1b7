//! Provider registry: resolve a provider name to a backend

use crate::http::require_key;
use crate::{
    anthropic, gemini, ollama, openai, AnthropicProvider, GeminiProvider, OllamaProvider,
    OpenAiProvider, ProviderSettings, StubProvider,
};
use bowtie_domain::{ExtractionProvider, ProviderError};
use std::sync::Arc;

/// Names accepted by [`provider_from_name`]
pub const SUPPORTED_PROVIDERS: &[&str] = &["stub", "openai", "anthropic", "gemini", "ollama"];

/// Build the provider called `name`, reading credentials from the process environment
///
/// # Errors
///
/// A configuration error for unknown names, an authentication error when the
/// provider's API key variable is unset.
pub fn provider_from_name(
    name: &str,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ExtractionProvider>, ProviderError> {
    provider_from_name_with_env(name, settings, |var| std::env::var(var).ok())
}

/// Build the provider called `name`, reading credentials through `env`
pub fn provider_from_name_with_env<F>(
    name: &str,
    settings: &ProviderSettings,
    env: F,
) -> Result<Arc<dyn ExtractionProvider>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider: Arc<dyn ExtractionProvider> = match name {
        "stub" => Arc::new(StubProvider::new()),
        "openai" => {
            let key = require_key(name, openai::API_KEY_VAR, &env)?;
            Arc::new(OpenAiProvider::new(key, settings)?)
        }
        "anthropic" => {
            let key = require_key(name, anthropic::API_KEY_VAR, &env)?;
            Arc::new(AnthropicProvider::new(key, settings)?)
        }
        "gemini" => {
            let key = require_key(name, gemini::API_KEY_VAR, &env)?;
            Arc::new(GeminiProvider::new(key, settings)?)
        }
        "ollama" => {
            let endpoint = settings
                .base_url
                .clone()
                .or_else(|| env(ollama::HOST_VAR))
                .unwrap_or_else(|| ollama::DEFAULT_ENDPOINT.to_string());
            Arc::new(OllamaProvider::new(endpoint, settings)?)
        }
        other => {
            return Err(ProviderError::configuration(
                other,
                format!(
                    "unknown provider '{}' (supported: {})",
                    other,
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ))
        }
    };

    tracing::debug!(provider = name, model = ?provider.model(), "provider resolved");
    Ok(provider)
}
