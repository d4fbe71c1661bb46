//! Configuration models for precept.
//!
//! All tunable parameters are resolved here, from a TOML file plus
//! environment variables for credentials.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for precept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source document settings
    #[serde(default)]
    pub constitution: ConstitutionConfig,

    /// Generation endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Dataset generation settings
    #[serde(default)]
    pub datagen: DatagenConfig,
}

/// Source document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstitutionConfig {
    /// URL of the source policy document
    #[serde(default = "default_constitution_url")]
    pub url: String,

    /// Local cache path for the downloaded document
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Display name substituted for the source document's model name
    #[serde(default = "default_target_model_name")]
    pub target_model_name: String,
}

fn default_constitution_url() -> String {
    "https://raw.githubusercontent.com/anthropics/claude-constitution/refs/heads/main/20260120-constitution.md"
        .to_string()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/constitution.md")
}

fn default_target_model_name() -> String {
    "Qwen".to_string()
}

impl Default for ConstitutionConfig {
    fn default() -> Self {
        Self {
            url: default_constitution_url(),
            cache_path: default_cache_path(),
            target_model_name: default_target_model_name(),
        }
    }
}

/// Generation endpoint configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key (can also be set via the `api_key_env` variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_timeout() -> u64 {
    180
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Dataset generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatagenConfig {
    /// Model identifier sent to the generation endpoint
    #[serde(default = "default_model")]
    pub model: String,

    /// Generation attempts issued per principle-scenario pair
    #[serde(default = "default_examples_per_principle")]
    pub examples_per_principle: usize,

    /// Cap on principles sampled from any one category
    #[serde(default = "default_max_principles_per_category")]
    pub max_principles_per_category: usize,

    /// Maximum simultaneously in-flight generation requests
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retry ceiling per generation attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Token budget per generation request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Destination for the persisted dataset (JSONL)
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

fn default_examples_per_principle() -> usize {
    3
}

fn default_max_principles_per_category() -> usize {
    30
}

fn default_max_concurrency() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/training_data.jsonl")
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            examples_per_principle: default_examples_per_principle(),
            max_principles_per_category: default_max_principles_per_category(),
            max_concurrency: default_max_concurrency(),
            max_retries: default_max_retries(),
            max_tokens: default_max_tokens(),
            output_path: default_output_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.api.api_key {
            return Ok(key.clone());
        }

        std::env::var(&self.api.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env_var: self.api.api_key_env.clone(),
        })
    }
}

/// Configuration errors. These are fatal at the boundary, before any
/// pipeline work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key: set {env_var} env var or api_key in config")]
    MissingApiKey { env_var: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.datagen.examples_per_principle, 3);
        assert_eq!(config.datagen.max_concurrency, 10);
        assert_eq!(config.datagen.max_retries, 3);
        assert_eq!(config.constitution.target_model_name, "Qwen");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [datagen]
            max_concurrency = 2
            model = "test/model"
            "#,
        )
        .unwrap();
        assert_eq!(config.datagen.max_concurrency, 2);
        assert_eq!(config.datagen.model, "test/model");
        assert_eq!(config.datagen.max_principles_per_category, 30);
        assert_eq!(config.api.timeout_secs, 180);
    }

    #[test]
    fn explicit_api_key_wins_over_env() {
        let config: Config = toml::from_str(
            r#"
            [api]
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.resolve_api_key().unwrap(), "sk-test");
    }
}
