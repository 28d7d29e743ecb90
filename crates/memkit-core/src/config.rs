//! ============================================================================
//! Configuration - Environment loading and settings resolution
//! ============================================================================
//! Every setting resolves through the same chain:
//! explicit value → named environment variable → default (or hard failure).
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::{MemoryError, Result};

/// Default Qwen embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-v4";

/// DashScope OpenAI-compatible endpoint
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Environment variable holding the DashScope API key
pub const QWEN_API_KEY_ENV: &str = "QWEN_API_KEY";

/// Default model used for memory categorization
pub const DEFAULT_CATEGORIZATION_MODEL: &str = "gpt-4o-mini";

/// OpenAI API endpoint used when `OPENAI_BASE_URL` is unset
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Trust store path used inside containers
pub const SSL_CERT_FILE_ENV: &str = "SSL_CERT_FILE";
pub const DEFAULT_SSL_CERT_FILE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// Embedding adapter settings. Unset fields fall back to the environment or
/// to the DashScope defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, alias = "openai_base_url")]
    pub base_url: Option<String>,
}

impl EmbedderConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Load `.env` (if present) and apply process-wide defaults.
///
/// Mutates the process environment: call once from a synchronous `main`,
/// before any runtime or other threads are started.
pub fn load_environment() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Could not load .env file: {}", e),
    }

    if env_lookup(SSL_CERT_FILE_ENV).is_none() {
        std::env::set_var(SSL_CERT_FILE_ENV, DEFAULT_SSL_CERT_FILE);
    }
}

/// Read a process environment variable, treating empty values as unset
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve a required secret: explicit value, then `env_var`, else a
/// configuration error naming the variable.
pub fn resolve_secret<F>(explicit: Option<&str>, env_var: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }

    match lookup(env_var).filter(|v| !v.is_empty()) {
        Some(value) => {
            debug!("Using {} from environment", env_var);
            Ok(value)
        }
        None => Err(MemoryError::Configuration(format!("{} not set", env_var))),
    }
}

/// Resolve an optional setting: explicit value, then `env_var`, else `default`
pub fn resolve_or_default<F>(explicit: Option<&str>, env_var: &str, default: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| lookup(env_var).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_string())
}

/// Path of the PEM bundle to trust for outbound TLS
pub fn ssl_cert_file() -> PathBuf {
    ssl_cert_file_with(env_lookup)
}

/// `ssl_cert_file` with a custom environment lookup
pub fn ssl_cert_file_with<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(resolve_or_default(
        None,
        SSL_CERT_FILE_ENV,
        DEFAULT_SSL_CERT_FILE,
        lookup,
    ))
}
