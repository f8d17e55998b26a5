//! Google Gemini provider implementation for the vox-providers crate.
//!
//! This module provides an implementation of the `LLMProvider` trait for models
//! served by the Gemini API (Gemini and Gemma families) through `generateContent`.
//!
//! Gemma models reject `system_instruction`, so callers that target them should
//! send the whole prompt as a single user message (see
//! [`CompletionRequest::single_prompt`]).
//!
//! # Usage
//!
//! ```rust,no_run
//! use vox_providers::{GeminiProvider, LLMProvider, CompletionRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = GeminiProvider::new(
//!         "your-api-key".to_string(),
//!         Some("gemma-3-4b-it".to_string()),
//!         None,
//!         Some(0.0),
//!     )?;
//!
//!     let request = CompletionRequest::single_prompt("Say hello".to_string(), Some(0.0));
//!     let response = provider.complete(request).await?;
//!     println!("Response: {}", response.content);
//!
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{CompletionRequest, CompletionResponse, LLMProvider, Message, MessageRole, Usage};

pub const DEFAULT_GEMINI_MODEL: &str = "gemma-3-4b-it";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Provider Struct
// ============================================================================

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    name: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<Self> {
        Self::new_with_name(
            "gemini".to_string(),
            api_key,
            model,
            max_tokens,
            temperature,
        )
    }

    pub fn new_with_name(
        name: String,
        api_key: String,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("Gemini provider '{}' has no API key", name);
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(1024),
            temperature: temperature.unwrap_or(0.0),
            name,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the provider at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get_api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

/// Gemini API request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Gemini API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

// ============================================================================
// Message Conversion
// ============================================================================

/// Convert vox messages to Gemini format
///
/// - Gemini uses "model" instead of "assistant"
/// - System messages go in system_instruction, not contents
fn convert_messages(messages: &[Message]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
    let mut contents = Vec::new();
    let mut system_instruction = None;

    for msg in messages {
        let part = GeminiPart {
            text: Some(msg.content.clone()),
        };
        match msg.role {
            MessageRole::System => {
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![part],
                });
            }
            MessageRole::User => contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: vec![part],
            }),
            MessageRole::Assistant => contents.push(GeminiContent {
                role: Some("model".to_string()),
                parts: vec![part],
            }),
        }
    }

    (contents, system_instruction)
}

/// Extract text content from Gemini response parts
fn extract_text_from_parts(parts: &[GeminiPart]) -> String {
    parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

fn convert_usage(metadata: Option<&GeminiUsageMetadata>) -> Usage {
    match metadata {
        Some(m) => Usage {
            prompt_tokens: m.prompt_token_count.unwrap_or(0),
            completion_tokens: m.candidates_token_count.unwrap_or(0),
            total_tokens: m.total_token_count.unwrap_or(0),
        },
        None => Usage::default(),
    }
}

// ============================================================================
// LLMProvider Implementation
// ============================================================================

impl GeminiProvider {
    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let (contents, system_instruction) = convert_messages(&request.messages);
        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens.or(Some(self.max_tokens)),
                temperature: request.temperature.or(Some(self.temperature)),
            },
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let gemini_request = self.build_request(&request);

        debug!("Gemini request: model={}", self.model);
        debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&gemini_request).unwrap_or_default()
        );

        let response = self
            .client
            .post(self.get_api_url())
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error ({}): {}", status, error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let gemini_response: GeminiResponse = response.json().await?;
        debug!("Gemini response: {:?}", gemini_response);

        let content = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .map(|c| extract_text_from_parts(&c.parts))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage: convert_usage(gemini_response.usage_metadata.as_ref()),
            model: self.model.clone(),
        })
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

// ============================================================================
// Unit Tests
// ============================================================================
