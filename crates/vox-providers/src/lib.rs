pub mod mock;
pub use mock::{MockProvider, MockResponse};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for text-completion providers
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for the given messages
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the configured max_tokens for this provider
    fn max_tokens(&self) -> u32;

    /// Get the configured temperature for this provider
    fn temperature(&self) -> f32;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// A single-prompt request, the shape the planner sends.
    pub fn single_prompt(prompt: String, temperature: Option<f32>) -> Self {
        Self {
            messages: vec![Message::new(MessageRole::User, prompt)],
            max_tokens: None,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self { role, content }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

/// Provider registry for managing multiple completion providers
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn LLMProvider>>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: String::new(),
        }
    }

    pub fn register<P: LLMProvider + 'static>(&mut self, provider: P) {
        self.register_boxed(Box::new(provider));
    }

    pub fn register_boxed(&mut self, provider: Box<dyn LLMProvider>) {
        let name = provider.name().to_string();
        self.providers.insert(name.clone(), provider);

        if self.default_provider.is_empty() {
            self.default_provider = name;
        }
    }

    pub fn set_default(&mut self, provider_name: &str) -> Result<()> {
        if !self.providers.contains_key(provider_name) {
            anyhow::bail!("Provider '{}' not found", provider_name);
        }
        self.default_provider = provider_name.to_string();
        Ok(())
    }

    pub fn get(&self, provider_name: Option<&str>) -> Result<&dyn LLMProvider> {
        let name = provider_name.unwrap_or(&self.default_provider);
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| anyhow::anyhow!("Provider '{}' not found", name))
    }

    /// Remove and return a provider, for callers that need ownership.
    pub fn take(&mut self, provider_name: Option<&str>) -> Result<Box<dyn LLMProvider>> {
        let name = provider_name
            .map(str::to_string)
            .unwrap_or_else(|| self.default_provider.clone());
        self.providers
            .remove(&name)
            .ok_or_else(|| anyhow::anyhow!("Provider '{}' not found", name))
    }

    pub fn list_providers(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_serializes_lowercase() {
        let msg = Message::new(MessageRole::User, "Hello".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn test_single_prompt_request() {
        let request = CompletionRequest::single_prompt("Open calculator".to_string(), Some(0.0));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.max_tokens.is_none());
    }

    #[test]
    fn test_registry_first_registered_is_default() {
        let mut registry = ProviderRegistry::new();
        registry.register(MockProvider::new().with_name("first"));
        registry.register(MockProvider::new().with_name("second"));

        assert_eq!(registry.get(None).unwrap().name(), "first");
        registry.set_default("second").unwrap();
        assert_eq!(registry.get(None).unwrap().name(), "second");
    }

    #[test]
    fn test_registry_unknown_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(MockProvider::new());

        assert!(registry.set_default("gemini.default").is_err());
        let err = registry.get(Some("nope")).err().unwrap();
        assert!(err.to_string().contains("'nope' not found"));
    }

    #[test]
    fn test_registry_take_removes_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(MockProvider::new().with_name("mock"));

        let provider = registry.take(None).unwrap();
        assert_eq!(provider.name(), "mock");
        assert!(registry.list_providers().is_empty());
    }
}
