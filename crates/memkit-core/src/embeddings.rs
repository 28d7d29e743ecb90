//! ============================================================================
//! Embedding Service - Qwen text embeddings via DashScope
//! ============================================================================
//! Generates text embeddings through DashScope's OpenAI-compatible API.
//! One request per text, no retries: transport and API errors reach the
//! caller as-is.
//! ============================================================================

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{
    self, EmbedderConfig, DEFAULT_EMBEDDING_BASE_URL, DEFAULT_EMBEDDING_MODEL, QWEN_API_KEY_ENV,
};
use crate::http;
use crate::types::{MemoryAction, MemoryError, Result};

/// Embedding adapter for Qwen models
pub struct QwenEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: Option<String>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

impl QwenEmbedder {
    /// Create an embedder, resolving the API key from `QWEN_API_KEY` when the
    /// config doesn't carry one
    pub fn new(config: Option<EmbedderConfig>) -> Result<Self> {
        Self::with_env(config, config::env_lookup)
    }

    /// Create an embedder with a custom environment lookup
    pub fn with_env<F>(config: Option<EmbedderConfig>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = config.unwrap_or_default();

        let model = config
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let api_key = config::resolve_secret(config.api_key.as_deref(), QWEN_API_KEY_ENV, lookup)?;
        let base_url = config
            .base_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_BASE_URL.to_string());

        debug!("Qwen embedder using model {} at {}", model, base_url);

        Ok(Self {
            client: http::build_client()?,
            api_key,
            base_url,
            model,
        })
    }

    /// Generate the embedding for a single text.
    ///
    /// Empty input returns an empty vector without calling the API. The
    /// action tag is accepted for interface compatibility; DashScope has no
    /// per-action embeddings so it isn't sent.
    pub async fn embed(&self, text: &str, action: Option<MemoryAction>) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(action) = action {
            debug!("Embedding for memory action '{}'", action);
        }

        let text = normalize_text(text);
        // DashScope rejects the `dimensions` parameter, so it is never sent
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text.as_str()],
        };

        debug!("Requesting embedding for {} chars", text.len());

        let response = self
            .client
            .post(http::endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = http::read_body(response).await?;

        let embedding_response: EmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
            MemoryError::Response(format!("Failed to parse embedding response: {}", e))
        })?;

        if let Some(usage) = &embedding_response.usage {
            debug!(
                "Embedding tokens used: {} (model: {})",
                usage.total_tokens,
                embedding_response.model.as_deref().unwrap_or(&self.model)
            );
        }

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| MemoryError::Response("No embedding returned".to_string()))
    }

    /// Get the current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Replace newlines with spaces; some embedding backends mishandle them
fn normalize_text(text: &str) -> String {
    text.replace('\n', " ")
}
