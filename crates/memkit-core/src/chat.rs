//! ============================================================================
//! Chat Completions - OpenAI-compatible chat client
//! ============================================================================
//! `ChatCompletion` is the seam the categorizer talks to; `OpenAiChatClient`
//! is the HTTP implementation.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{self, DEFAULT_OPENAI_BASE_URL, OPENAI_API_KEY_ENV, OPENAI_BASE_URL_ENV};
use crate::http;
use crate::types::{MemoryError, Result};

/// A chat-completion backend
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one request and return the first choice's message content
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>>;
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    /// Ask the model for a single JSON object
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// HTTP client
// ============================================================================

/// Chat client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::build_client()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    /// Build from `OPENAI_API_KEY` and `OPENAI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = config::resolve_secret(None, OPENAI_API_KEY_ENV, config::env_lookup)?;
        let base_url = config::resolve_or_default(
            None,
            OPENAI_BASE_URL_ENV,
            DEFAULT_OPENAI_BASE_URL,
            config::env_lookup,
        );
        Self::new(api_key, base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>> {
        debug!(
            "Calling chat completions ({}, {} messages)",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(http::endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let body = http::read_body(response).await?;

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| MemoryError::Response(format!("Failed to parse API response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| MemoryError::Response("No choices in API response".to_string()))
    }
}
