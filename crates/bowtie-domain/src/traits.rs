//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and its
//! collaborators. Implementations live in other crates.

use crate::ProviderError;

/// An LLM backend that turns a prompt into raw response text
///
/// Implemented by the infrastructure layer (bowtie-llm). Implementations are
/// synchronous; the orchestrator calls them from a blocking task.
pub trait ExtractionProvider: Send + Sync {
    /// Provider name used in manifests and output paths (`stub`, `openai`, ...)
    fn name(&self) -> &str;

    /// Model identifier, if the provider has one
    fn model(&self) -> Option<&str> {
        None
    }

    /// Run one extraction
    ///
    /// On failure no response text is returned; a truncated or garbled
    /// completion must surface as an error.
    fn extract(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Builds the complete prompt for one incident narrative
///
/// Treated by the orchestrator as an opaque pure function.
pub trait PromptAssembler: Send + Sync {
    /// Assemble the prompt for `incident_text`
    fn assemble(&self, incident_text: &str) -> String;
}

impl<P: ExtractionProvider + ?Sized> ExtractionProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        (**self).extract(prompt)
    }
}

impl<P: ExtractionProvider + ?Sized> ExtractionProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        (**self).extract(prompt)
    }
}
