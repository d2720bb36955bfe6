// Providers module
// HTTP clients for the services that embed text and generate answers

pub mod http;
pub mod ollama;
pub mod openai;

#[cfg(test)]
mod tests;

use tracing::info;

use crate::Result;
use crate::config::{Config, ProviderKind};
use crate::embeddings::Embedder;
use crate::synthesis::{GenerationRequest, Generator};

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// The configured embedding and generation service
#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi(OpenAiClient),
    Ollama(OllamaClient),
}

impl Provider {
    /// Create the client named by `config.provider.kind`.
    ///
    /// Reads the API key from the environment once; a provider that needs
    /// a key fails here with [`crate::DocQaError::MissingCredential`].
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.credentials()?;

        info!(
            "Using {} provider (embedding model {}, generation model {})",
            config.provider.kind,
            config.provider.embedding_model(),
            config.provider.generation_model()
        );

        match (config.provider.kind, api_key) {
            (ProviderKind::OpenAi, Some(key)) => {
                Ok(Self::OpenAi(OpenAiClient::new(&config.provider, key)?))
            }
            (ProviderKind::OpenAi, None) => Err(crate::DocQaError::MissingCredential(
                config.provider.api_key_env().to_string(),
            )),
            (ProviderKind::Ollama, key) => {
                Ok(Self::Ollama(OllamaClient::new(&config.provider, key)?))
            }
        }
    }

    #[inline]
    pub fn health_check(&self) -> Result<()> {
        match self {
            Self::OpenAi(client) => client.health_check(),
            Self::Ollama(client) => client.health_check(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Ollama(_) => ProviderKind::Ollama,
        }
    }
}

impl Embedder for Provider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Self::OpenAi(client) => client.embed(text),
            Self::Ollama(client) => client.embed(text),
        }
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::OpenAi(client) => client.embed_batch(texts),
            Self::Ollama(client) => client.embed_batch(texts),
        }
    }
}

impl Generator for Provider {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self {
            Self::OpenAi(client) => client.generate(request),
            Self::Ollama(client) => client.generate(request),
        }
    }
}
