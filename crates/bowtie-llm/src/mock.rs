//! Scripted mock provider for deterministic testing
//!
//! Responses are served in this order:
//! 1. A rule whose needle occurs in the prompt (first registered wins)
//! 2. The next entry of the script queue
//! 3. The default response

use crate::STUB_RESPONSE;
use bowtie_domain::{ExtractionProvider, ProviderError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

type Reply = Result<String, ProviderError>;

/// Mock provider returning canned responses and failures
///
/// Clones share the script and the call counter.
///
/// # Examples
///
/// ```
/// use bowtie_domain::{ExtractionProvider, ProviderError};
/// use bowtie_llm::MockProvider;
///
/// let provider = MockProvider::new("{}")
///     .push_error(ProviderError::rate_limited("mock", "slow down"))
///     .push_response("first");
///
/// assert!(provider.extract("p").is_err());
/// assert_eq!(provider.extract("p").unwrap(), "first");
/// assert_eq!(provider.extract("p").unwrap(), "{}");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    model: Option<String>,
    default_response: Reply,
    rules: Arc<Mutex<Vec<(String, VecDeque<Reply>)>>>,
    script: Arc<Mutex<VecDeque<Reply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a mock with a fixed default response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            model: None,
            default_response: Ok(response.into()),
            rules: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails every call not covered by the script
    pub fn failing(error: ProviderError) -> Self {
        Self {
            default_response: Err(error),
            ..Self::new("")
        }
    }

    /// Report a different provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Report a model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Queue a successful response
    pub fn push_response(self, response: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(response.into()));
        self
    }

    /// Queue a failure
    pub fn push_error(self, error: ProviderError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Answer prompts containing `needle` with `replies`, in order
    ///
    /// Once the replies run out, the last one is repeated.
    pub fn when_prompt_contains<I>(self, needle: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = Reply>,
    {
        lock(&self.rules).push((needle.into(), replies.into_iter().collect()));
        self
    }

    /// Number of times `extract` was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Forget recorded calls
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        {
            let mut rules = lock(&self.rules);
            if let Some((_, replies)) = rules
                .iter_mut()
                .find(|(needle, replies)| !replies.is_empty() && prompt.contains(needle.as_str()))
            {
                return match replies.len() {
                    1 => replies[0].clone(),
                    _ => replies.pop_front().unwrap_or_else(|| self.default_response.clone()),
                };
            }
        }
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(STUB_RESPONSE)
    }
}

impl ExtractionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    fn extract(&self, prompt: &str) -> Result<String, ProviderError> {
        lock(&self.prompts).push(prompt.to_string());
        self.reply_for(prompt)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bowtie_domain::ProviderErrorKind;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.extract("any prompt").unwrap(), "Test response");
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_mock_provider_script_then_default() {
        let provider = MockProvider::default()
            .push_error(ProviderError::transport("mock", "reset"))
            .push_error(ProviderError::rate_limited("mock", "429"))
            .push_response("{\"a\": 1}");

        assert_eq!(provider.extract("p").unwrap_err().kind, ProviderErrorKind::Transport);
        assert_eq!(provider.extract("p").unwrap_err().kind, ProviderErrorKind::RateLimited);
        assert_eq!(provider.extract("p").unwrap(), "{\"a\": 1}");
        assert_eq!(provider.extract("p").unwrap(), STUB_RESPONSE);
    }

    #[test]
    fn test_mock_provider_prompt_rules() {
        let provider = MockProvider::default().when_prompt_contains(
            "valve",
            [
                Err(ProviderError::transport("mock", "reset")),
                Ok("Here you go: {}".to_string()),
            ],
        );

        assert!(provider.extract("the valve failed").is_err());
        assert_eq!(provider.extract("the valve failed").unwrap(), "Here you go: {}");
        assert_eq!(provider.extract("the valve failed").unwrap(), "Here you go: {}");
        assert_eq!(provider.extract("the pump failed").unwrap(), STUB_RESPONSE);
    }

    #[test]
    fn test_mock_provider_failing() {
        let provider = MockProvider::failing(ProviderError::authentication("mock", "401"));
        let err = provider.extract("p").unwrap_err();
        assert!(!err.retryable());
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.extract("prompt1").unwrap();
        provider.extract("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test").with_name("openai").with_model("gpt-4o");
        let provider2 = provider1.clone();

        provider1.extract("test").unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
        assert_eq!(provider2.name(), "openai");
        assert_eq!(provider2.model(), Some("gpt-4o"));
    }
}
