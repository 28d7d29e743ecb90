//! ============================================================================
//! Memory Categorization - LLM-assigned category labels
//! ============================================================================
//! Asks a chat model to label a memory string with topic categories.
//!
//! - The chat client is built lazily on first use through a factory, so no
//!   credentials are needed until categorization actually runs
//! - Each attempt is one deterministic (temperature 0) JSON-mode request
//! - Failed attempts are retried with capped exponential backoff
//! ============================================================================

use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chat::{ChatCompletion, ChatMessage, ChatRequest, OpenAiChatClient, ResponseFormat};
use crate::config::DEFAULT_CATEGORIZATION_MODEL;
use crate::prompts::MEMORY_CATEGORIZATION_PROMPT;
use crate::retry::RetryPolicy;
use crate::types::{MemoryCategories, MemoryError, Result};

/// Builds the chat client on first use
pub type ClientFactory = Box<dyn Fn() -> Result<Arc<dyn ChatCompletion>> + Send + Sync>;

static DEFAULT_CATEGORIZER: Lazy<Categorizer> = Lazy::new(Categorizer::new);

/// Categorize a memory with the process-wide default categorizer
/// (OpenAI credentials from the environment).
pub async fn get_categories_for_memory(memory: &str) -> Result<Vec<String>> {
    DEFAULT_CATEGORIZER.categories_for_memory(memory).await
}

pub struct Categorizer {
    factory: ClientFactory,
    client: OnceCell<Arc<dyn ChatCompletion>>,
    model: String,
    retry: RetryPolicy,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Categorizer {
    /// Categorizer backed by `OpenAiChatClient::from_env`
    pub fn new() -> Self {
        Self::with_factory(|| {
            let client = OpenAiChatClient::from_env()?;
            Ok(Arc::new(client) as Arc<dyn ChatCompletion>)
        })
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ChatCompletion>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            client: OnceCell::new(),
            model: DEFAULT_CATEGORIZATION_MODEL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Categorizer using an already-built client
    pub fn with_client(client: Arc<dyn ChatCompletion>) -> Self {
        Self::with_factory(move || Ok(Arc::clone(&client)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the categories for a memory: trimmed, lower-cased, in model order.
    ///
    /// Any failure (client construction, transport, API status, empty or
    /// malformed content) is retried per the retry policy; the last error is
    /// returned once attempts run out.
    pub async fn categories_for_memory(&self, memory: &str) -> Result<Vec<String>> {
        self.retry
            .run("Memory categorization", |_| self.categorize_once(memory))
            .await
    }

    async fn categorize_once(&self, memory: &str) -> Result<Vec<String>> {
        let client = self.client()?;
        let request = self.build_request(memory);

        let content = client.complete(&request).await?;
        let categories = parse_categories(content.as_deref())?;

        debug!("Memory categorized as {:?}", categories);
        Ok(categories)
    }

    fn client(&self) -> Result<Arc<dyn ChatCompletion>> {
        self.client
            .get_or_try_init(|| {
                info!("Initializing chat client for memory categorization");
                (self.factory)()
            })
            .map(Arc::clone)
    }

    fn build_request(&self, memory: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(MEMORY_CATEGORIZATION_PROMPT),
                ChatMessage::user(memory),
            ],
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::json_object()),
        }
    }
}

/// Parse the model's JSON answer into normalized category labels
pub fn parse_categories(content: Option<&str>) -> Result<Vec<String>> {
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| MemoryError::Response("Empty response from chat completion API".to_string()))?;

    let parsed: MemoryCategories = serde_json::from_str(content)
        .map_err(|e| MemoryError::Response(format!("Invalid categories JSON: {}", e)))?;

    Ok(parsed.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Chat client that replays canned replies and records requests
    struct ScriptedChat {
        replies: Mutex<VecDeque<Result<Option<String>>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChat {
        fn new(replies: Vec<Result<Option<String>>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatCompletion for ScriptedChat {
        async fn complete(&self, request: &ChatRequest) -> Result<Option<String>> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MemoryError::Response("script exhausted".to_string())))
        }
    }

    fn ok(content: &str) -> Result<Option<String>> {
        Ok(Some(content.to_string()))
    }

    #[test]
    fn test_parse_categories() {
        let categories =
            parse_categories(Some(r#"{"categories": ["Work", " Personal "]}"#)).unwrap();
        assert_eq!(categories, vec!["work", "personal"]);
    }

    #[test]
    fn test_parse_categories_rejects_bad_content() {
        for content in [None, Some(""), Some("   "), Some("not json"), Some(r#"{"tags": ["work"]}"#)] {
            let result = parse_categories(content);
            assert!(
                matches!(result, Err(MemoryError::Response(_))),
                "Expected Response error for {:?}",
                content
            );
        }
    }

    #[test]
    fn test_parse_categories_empty_list_is_ok() {
        assert!(parse_categories(Some(r#"{"categories": []}"#)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_shape() {
        let chat = ScriptedChat::new(vec![ok(r#"{"categories": ["Health"]}"#)]);
        let categorizer = Categorizer::with_client(chat.clone());

        let categories = categorizer
            .categories_for_memory("Started running every morning")
            .await
            .unwrap();
        assert_eq!(categories, vec!["health"]);

        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, DEFAULT_CATEGORIZATION_MODEL);
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::system(MEMORY_CATEGORIZATION_PROMPT),
                ChatMessage::user("Started running every morning"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_memory_is_sent_as_is() {
        let chat = ScriptedChat::new(vec![ok(r#"{"categories": ["misc"]}"#)]);
        let categorizer = Categorizer::with_client(chat.clone()).with_model("gpt-4.1-nano");

        categorizer.categories_for_memory("").await.unwrap();

        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests[0].messages[1], ChatMessage::user(""));
        assert_eq!(requests[0].model, "gpt-4.1-nano");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let chat = ScriptedChat::new(vec![
            Err(MemoryError::Api {
                status: 500,
                message: "server error".to_string(),
            }),
            Ok(None),
            ok(r#"{"categories": ["Finance", "Goals"]}"#),
        ]);
        let categorizer = Categorizer::with_client(chat.clone());

        let categories = categorizer
            .categories_for_memory("Saving for a house by 2027")
            .await
            .unwrap();

        assert_eq!(categories, vec!["finance", "goals"]);
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let chat = ScriptedChat::new(vec![
            ok("not json"),
            ok(r#"{"labels": []}"#),
            Ok(Some(String::new())),
            ok(r#"{"categories": ["never reached"]}"#),
        ]);
        let categorizer = Categorizer::with_client(chat.clone());
        let start = tokio::time::Instant::now();

        let err = categorizer.categories_for_memory("memory").await.unwrap_err();

        match err {
            MemoryError::Response(msg) => assert!(msg.contains("Empty response")),
            other => panic!("Expected Response error, got {:?}", other),
        }
        assert_eq!(chat.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test]
    async fn test_client_built_lazily_and_once() {
        let builds = Arc::new(AtomicU32::new(0));
        let chat = ScriptedChat::new(vec![
            ok(r#"{"categories": ["Work"]}"#),
            ok(r#"{"categories": ["Travel"]}"#),
        ]);

        let counter = Arc::clone(&builds);
        let shared = chat.clone();
        let categorizer = Categorizer::with_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(shared.clone() as Arc<dyn ChatCompletion>)
        });
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        assert_eq!(categorizer.categories_for_memory("a").await.unwrap(), vec!["work"]);
        assert_eq!(categorizer.categories_for_memory("b").await.unwrap(), vec!["travel"]);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_factory_failure_is_retried() {
        let builds = Arc::new(AtomicU32::new(0));
        let chat = ScriptedChat::new(vec![ok(r#"{"categories": ["Work"]}"#)]);

        let counter = Arc::clone(&builds);
        let shared = chat.clone();
        let categorizer = Categorizer::with_factory(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MemoryError::Configuration("OPENAI_API_KEY not set".to_string()))
            } else {
                Ok(shared.clone() as Arc<dyn ChatCompletion>)
            }
        });

        let categories = categorizer.categories_for_memory("a").await.unwrap();
        assert_eq!(categories, vec!["work"]);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_openai_client_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "{\"categories\": [\"Work\", \" Personal \"]}"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = format!("{}/v1", server.uri());
        let categorizer = Categorizer::with_factory(move || {
            let client = OpenAiChatClient::new("sk-test", base_url.clone())?;
            Ok(Arc::new(client) as Arc<dyn ChatCompletion>)
        })
        .with_retry(RetryPolicy::no_retry());

        let categories = categorizer
            .categories_for_memory("Promoted to team lead; celebrating with family")
            .await
            .unwrap();
        assert_eq!(categories, vec!["work", "personal"]);
    }
}
