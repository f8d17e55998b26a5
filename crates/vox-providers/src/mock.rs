//! Mock completion provider for testing
//!
//! A scripted provider that returns queued responses in order and records
//! every request it receives, so planner and pipeline tests can run without
//! a real completion service.
//!
//! # Example
//!
//! ```rust,ignore
//! use vox_providers::mock::{MockProvider, MockResponse};
//!
//! let provider = MockProvider::new()
//!     .with_response(MockResponse::error("503 Service Unavailable"))
//!     .with_response(MockResponse::text(r#"{"steps": []}"#));
//! ```

use crate::{CompletionRequest, CompletionResponse, LLMProvider, Usage};
use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock response that can be configured for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Completion text, or the error message to fail with
    pub outcome: std::result::Result<String, String>,
    /// Simulated latency before the response is returned
    pub delay: Option<Duration>,
    pub usage: Usage,
}

impl MockResponse {
    /// A successful completion with the given text
    pub fn text(content: &str) -> Self {
        Self {
            outcome: Ok(content.to_string()),
            delay: None,
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: content.len() as u32 / 4,
                total_tokens: 100 + content.len() as u32 / 4,
            },
        }
    }

    /// A failed completion; the message drives error classification upstream
    pub fn error(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            usage: Usage::default(),
        }
    }

    /// Builder: delay the response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A mock provider for testing
///
/// The provider maintains a queue of responses that are returned in order.
/// It also tracks all requests made for verification in tests.
pub struct MockProvider {
    name: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    /// Queue of responses to return (FIFO)
    responses: Arc<Mutex<Vec<MockResponse>>>,
    /// All requests received (for verification)
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Default response when queue is empty
    default_response: Option<MockResponse>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            model: "mock-model".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_response: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Add a response to the queue
    pub fn with_response(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Add multiple responses to the queue
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        self.responses.lock().unwrap().extend(responses);
        self
    }

    /// Set a default response when queue is empty
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Shared handle on the recorded requests, usable after the provider
    /// has been moved into a planner.
    pub fn requests_handle(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_response(&self) -> MockResponse {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            self.default_response
                .clone()
                .unwrap_or_else(|| MockResponse::text("Mock response (no responses configured)"))
        } else {
            responses.remove(0)
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LLMProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);

        let response = self.next_response();
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        match response.outcome {
            Ok(content) => Ok(CompletionResponse {
                content,
                usage: response.usage,
                model: self.model.clone(),
            }),
            Err(message) => Err(anyhow::anyhow!(message)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_returns_in_order() {
        let provider = MockProvider::new()
            .with_response(MockResponse::text("first"))
            .with_response(MockResponse::text("second"));

        let request = CompletionRequest::single_prompt("hi".to_string(), None);
        let r1 = provider.complete(request.clone()).await.unwrap();
        let r2 = provider.complete(request.clone()).await.unwrap();
        let r3 = provider.complete(request).await.unwrap();

        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
        assert!(r3.content.contains("no responses configured"));
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::new().with_response(MockResponse::error("429 rate limit"));

        let err = provider
            .complete(CompletionRequest::single_prompt("hi".to_string(), None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_mock_provider_request_tracking() {
        let provider = MockProvider::new().with_default_response(MockResponse::text("ok"));
        let handle = provider.requests_handle();

        provider
            .complete(CompletionRequest::single_prompt("Open calculator".to_string(), Some(0.0)))
            .await
            .unwrap();

        let requests = handle.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "Open calculator");
        assert_eq!(requests[0].temperature, Some(0.0));
    }
}
