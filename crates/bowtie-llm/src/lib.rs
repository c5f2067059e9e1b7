//! Bowtie LLM Provider Layer
//!
//! Pluggable extraction backends behind the `ExtractionProvider` trait from
//! `bowtie-domain`.
//!
//! # Providers
//!
//! - `StubProvider`: Fixed, schema-valid response; no network
//! - `MockProvider`: Scripted sequence of responses and failures for tests
//! - `OpenAiProvider`, `AnthropicProvider`, `GeminiProvider`: hosted vendors
//! - `OllamaProvider`: Local Ollama API integration
//!
//! Every vendor failure is normalized into a `ProviderError` whose kind
//! decides whether the orchestrator retries. Providers never retry
//! internally.
//!
//! # Examples
//!
//! ```
//! use bowtie_llm::{provider_from_name, ProviderSettings};
//!
//! let provider = provider_from_name("stub", &ProviderSettings::default()).unwrap();
//! let raw = provider.extract("any prompt").unwrap();
//! assert!(raw.contains("STUB-001"));
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod gemini;
mod http;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod settings;
pub mod stub;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{provider_from_name, provider_from_name_with_env, SUPPORTED_PROVIDERS};
pub use settings::ProviderSettings;
pub use stub::{StubProvider, STUB_RESPONSE};
