//! ============================================================================
//! Core Types - Errors, memory actions and category payloads
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Error types for embedding and categorization
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// A required setting (usually an API key) could not be resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The remote API answered, but the body was empty or malformed
    #[error("Invalid response: {0}")]
    Response(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

/// What the caller intends to do with an embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryAction {
    Add,
    Search,
    Update,
}

impl MemoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryAction::Add => "add",
            MemoryAction::Search => "search",
            MemoryAction::Update => "update",
        }
    }
}

impl std::fmt::Display for MemoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(MemoryAction::Add),
            "search" => Ok(MemoryAction::Search),
            "update" => Ok(MemoryAction::Update),
            _ => Err(format!(
                "Unknown memory action '{}'. Valid values: add, search, update",
                s
            )),
        }
    }
}

/// JSON payload returned by the categorization model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCategories {
    pub categories: Vec<String>,
}

impl MemoryCategories {
    /// Trimmed, lower-cased labels in their original order
    pub fn normalized(self) -> Vec<String> {
        self.categories
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .collect()
    }
}
