/// Configuration management for Flowsmith
///
/// Handles server configuration, database location, and generation provider settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Text-generation provider configuration
    pub generation: GenerationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the SQLite file (default: "data")
    /// Creates: {data_dir}/flowsmith.db
    pub data_dir: String,
}

impl DatabaseConfig {
    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("flowsmith.db")
    }
}

/// Settings for the OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL without the trailing `/chat/completions`
    pub api_base: String,
    /// Bearer token; requests are sent unauthenticated when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Fixed sampling temperature
    pub temperature: f32,
    /// Upper bound on the reply size
    pub max_tokens: u32,
    /// Per-request timeout for the provider call
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            request_timeout_secs: 120,
        }
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        let generation_defaults = GenerationConfig::default();

        Self {
            server: ServerConfig {
                host: std::env::var("FLOWSMITH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("FLOWSMITH_PORT", 3004),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("FLOWSMITH_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            generation: GenerationConfig {
                api_base: std::env::var("FLOWSMITH_API_BASE")
                    .unwrap_or(generation_defaults.api_base),
                api_key: std::env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
                model: std::env::var("FLOWSMITH_MODEL").unwrap_or(generation_defaults.model),
                temperature: env_parse("FLOWSMITH_TEMPERATURE", generation_defaults.temperature),
                max_tokens: env_parse("FLOWSMITH_MAX_TOKENS", generation_defaults.max_tokens),
                request_timeout_secs: env_parse(
                    "FLOWSMITH_REQUEST_TIMEOUT_SECS",
                    generation_defaults.request_timeout_secs,
                ),
            },
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset or unparsable
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
