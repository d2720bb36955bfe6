#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::http::HttpClient;
use crate::config::{ApiKey, ProviderConfig};
use crate::embeddings::Embedder;
use crate::synthesis::{GenerationRequest, Generator};
use crate::{DocQaError, Result};

/// Client for a local or remote Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    embedding_model: String,
    generation_model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &ProviderConfig, api_key: Option<ApiKey>) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            embedding_model: config.embedding_model().to_string(),
            generation_model: config.generation_model().to_string(),
            http: HttpClient::new(Duration::from_secs(config.timeout_seconds), api_key),
        })
    }

    /// Test connection to the Ollama server and verify both models are pulled
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.validate_model(&self.embedding_model)?;
        self.validate_model(&self.generation_model)?;

        info!(
            "Health check passed for Ollama server at {} with models {} and {}",
            self.base_url, self.embedding_model, self.generation_model
        );
        Ok(())
    }

    /// Check that `model` is available on the server
    #[inline]
    pub fn validate_model(&self, model: &str) -> Result<()> {
        debug!("Validating model: {}", model);

        let models = self.list_models()?;

        if models.iter().any(|m| m.name == model) {
            debug!("Model {} is available", model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                model, available_models
            );
            Err(DocQaError::InvalidConfig(format!(
                "Model '{}' is not available. Available models: {:?}",
                model, available_models
            )))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("api/tags")?;

        debug!("Fetching available models from {}", url);

        let text = self
            .http
            .get(&url)
            .map_err(|e| {
                DocQaError::EmbeddingUnavailable(format!("Failed to list models: {}", e))
            })?;

        let response: ModelsResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::EmbeddingUnavailable(format!("Failed to parse models response: {}", e))
        })?;

        debug!("Found {} models", response.models.len());
        Ok(response.models)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocQaError::InvalidConfig(format!("Failed to build {} URL: {}", path, e)))
    }
}

impl Embedder for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| DocQaError::EmbeddingUnavailable("Empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let url = self.endpoint("api/embed")?;
        let request = EmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let text = self
            .http
            .post_json(&url, &request)
            .map_err(|e| DocQaError::EmbeddingUnavailable(e.to_string()))?;

        let response: EmbedResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::EmbeddingUnavailable(format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(DocQaError::EmbeddingUnavailable(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        debug!(
            "Generated {} embeddings with {} dimensions",
            response.embeddings.len(),
            response.embeddings.first().map_or(0, Vec::len)
        );

        Ok(response.embeddings)
    }
}

impl Generator for OllamaClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint("api/generate")?;
        let body = GenerateRequest {
            model: &self.generation_model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            },
        };

        let text = self
            .http
            .post_json(&url, &body)
            .map_err(|e| DocQaError::GenerationUnavailable(e.to_string()))?;

        let response: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::GenerationUnavailable(format!("Failed to parse generate response: {}", e))
        })?;

        Ok(response.response)
    }
}
