
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::DocQaError;
use crate::embeddings::EmbeddingConfig;
use crate::embeddings::chunking::ChunkingConfig;
use crate::pipeline::PipelineSettings;
use crate::retrieval::RetrievalConfig;
use crate::synthesis::GenerationConfig;

pub const CONFIG_FILE_NAME: &str = "config.toml";
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const OLLAMA_API_KEY_ENV: &str = "OLLAMA_API_KEY";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const OPENAI_GENERATION_MODEL: &str = "gpt-3.5-turbo";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/";
const OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";
const OLLAMA_GENERATION_MODEL: &str = "llama3.2:latest";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl fmt::Display for ProviderKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Ollama => f.write_str("ollama"),
        }
    }
}

/// Connection settings for the embedding and generation service.
///
/// Unset URL, model and API key variable fields fall back to defaults for the
/// selected `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub embedding_model: Option<String>,
    pub generation_model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            embedding_model: None,
            generation_model: None,
            api_key_env: None,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid API key variable name: {0:?}")]
    InvalidApiKeyEnv(String),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid batch size: {0} (must be between 1 and 2048)")]
    InvalidBatchSize(usize),
    #[error("Invalid concurrent batch count: {0} (must be between 1 and 64)")]
    InvalidConcurrency(usize),
    #[error("Invalid max chunk size: {0} (must be greater than 0)")]
    InvalidMaxSize(usize),
    #[error("Overlap ({0}) must be smaller than max chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid max output tokens: {0} (must be between 1 and 32768)")]
    InvalidMaxOutputTokens(u32),
    #[error("Environment variable {0} is not set")]
    MissingCredential(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for DocQaError {
    #[inline]
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::MissingCredential(var) => Self::MissingCredential(var),
            ConfigError::Io(e) => Self::Io(e),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}

/// API key read once from the process environment
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from `var`, treating unset and blank values alike
    #[inline]
    pub fn from_env(var: &str) -> Result<Self, ConfigError> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(Self(value.trim().to_string())),
            _ => Err(ConfigError::MissingCredential(var.to_string())),
        }
    }

    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl Config {
    /// Get the default configuration directory
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".doc-qa"))
            .or_else(|| dirs::config_dir().map(|config| config.join("doc-qa")))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load `config.toml` from `config_dir`, falling back to defaults when it does not exist
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> crate::Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::from)?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config.validate()?;

        debug!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> crate::Result<()> {
        self.validate()?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate()?;
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.retrieval.validate()?;
        self.generation.validate()?;
        Ok(())
    }

    /// Read the API key the configured provider needs.
    ///
    /// OpenAI requires a key; Ollama uses one only when the variable is set.
    #[inline]
    pub fn credentials(&self) -> Result<Option<ApiKey>, ConfigError> {
        match self.provider.kind {
            ProviderKind::OpenAi => ApiKey::from_env(self.provider.api_key_env()).map(Some),
            ProviderKind::Ollama => Ok(ApiKey::from_env(self.provider.api_key_env()).ok()),
        }
    }

    /// The provider-independent part of the configuration
    #[inline]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            chunking: self.chunking.clone(),
            embedding: self.embedding.clone(),
            retrieval: self.retrieval.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl ProviderConfig {
    /// Default settings for a provider kind
    #[inline]
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        if self.embedding_model().trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model().to_string()));
        }

        if self.generation_model().trim().is_empty() {
            return Err(ConfigError::InvalidModel(
                self.generation_model().to_string(),
            ));
        }

        let api_key_env = self.api_key_env();
        if api_key_env.trim().is_empty() || api_key_env.contains(['=', '\0']) {
            return Err(ConfigError::InvalidApiKeyEnv(api_key_env.to_string()));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    /// Base URL of the provider API, always ending in `/` so relative joins keep the path
    #[inline]
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.as_deref().unwrap_or(match self.kind {
            ProviderKind::OpenAi => OPENAI_BASE_URL,
            ProviderKind::Ollama => OLLAMA_BASE_URL,
        });

        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };

        let url = Url::parse(&normalized).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        Ok(url)
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or(match self.kind {
            ProviderKind::OpenAi => OPENAI_EMBEDDING_MODEL,
            ProviderKind::Ollama => OLLAMA_EMBEDDING_MODEL,
        })
    }

    #[inline]
    pub fn generation_model(&self) -> &str {
        self.generation_model.as_deref().unwrap_or(match self.kind {
            ProviderKind::OpenAi => OPENAI_GENERATION_MODEL,
            ProviderKind::Ollama => OLLAMA_GENERATION_MODEL,
        })
    }

    /// Environment variable the API key is read from
    #[inline]
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(match self.kind {
            ProviderKind::OpenAi => OPENAI_API_KEY_ENV,
            ProviderKind::Ollama => OLLAMA_API_KEY_ENV,
        })
    }

    #[inline]
    pub fn set_base_url(&mut self, base_url: String) -> Result<(), ConfigError> {
        let temp_config = Self {
            base_url: Some(base_url.clone()),
            ..self.clone()
        };
        temp_config.base_url()?;
        self.base_url = Some(base_url);
        Ok(())
    }

    #[inline]
    pub fn set_embedding_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.embedding_model = Some(model);
        Ok(())
    }

    #[inline]
    pub fn set_generation_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.generation_model = Some(model);
        Ok(())
    }
}
