//! ============================================================================
//! MEMKIT-CORE: Embeddings & categorization for memory pipelines
//! ============================================================================
//! This crate holds the two remote-model adapters used when storing memories:
//! - Qwen text embeddings via DashScope's OpenAI-compatible API
//! - Memory categorization via an OpenAI-compatible chat model, with retries
//!
//! ## Usage
//! ```rust,ignore
//! use memkit_core::{config, Categorizer, MemoryAction, QwenEmbedder};
//!
//! config::load_environment();
//!
//! let embedder = QwenEmbedder::new(None)?;
//! let vector = embedder.embed("User prefers dark mode", Some(MemoryAction::Add)).await?;
//!
//! let categorizer = Categorizer::new();
//! let categories = categorizer.categories_for_memory("User prefers dark mode").await?;
//! ```
//! ============================================================================

pub mod categorization;
pub mod chat;
pub mod config;
pub mod embeddings;
pub mod http;
pub mod prompts;
pub mod retry;
pub mod types;

// Re-export main types for convenience
pub use categorization::{get_categories_for_memory, Categorizer};
pub use chat::{ChatCompletion, OpenAiChatClient};
pub use config::EmbedderConfig;
pub use embeddings::QwenEmbedder;
pub use retry::RetryPolicy;
pub use types::*;
