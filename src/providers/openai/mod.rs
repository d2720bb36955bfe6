
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::http::HttpClient;
use crate::config::{ApiKey, ProviderConfig};
use crate::embeddings::Embedder;
use crate::synthesis::{GenerationRequest, Generator};
use crate::{DocQaError, Result};

/// Client for the OpenAI embeddings and chat completions APIs
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    embedding_model: String,
    generation_model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub id: String,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &ProviderConfig, api_key: ApiKey) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            embedding_model: config.embedding_model().to_string(),
            generation_model: config.generation_model().to_string(),
            http: HttpClient::new(Duration::from_secs(config.timeout_seconds), Some(api_key)),
        })
    }

    /// Verify the API is reachable, the key is accepted and both models exist
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for OpenAI at {}", self.base_url);

        let models = self.list_models()?;
        for model in [&self.embedding_model, &self.generation_model] {
            if !models.iter().any(|m| &m.id == model) {
                warn!("Model {} not found among {} models", model, models.len());
                return Err(DocQaError::InvalidConfig(format!(
                    "Model '{}' is not available",
                    model
                )));
            }
        }

        info!(
            "Health check passed for OpenAI at {} with models {} and {}",
            self.base_url, self.embedding_model, self.generation_model
        );
        Ok(())
    }

    /// List the models available to this API key
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("models")?;
        let text = self
            .http
            .get(&url)
            .map_err(|e| {
                DocQaError::EmbeddingUnavailable(format!("Failed to list models: {}", e))
            })?;

        let response: ModelsResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::EmbeddingUnavailable(format!("Failed to parse models response: {}", e))
        })?;

        debug!("Found {} models", response.data.len());
        Ok(response.data)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocQaError::InvalidConfig(format!("Failed to build {} URL: {}", path, e)))
    }
}

impl Embedder for OpenAiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| DocQaError::EmbeddingUnavailable("Empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint("embeddings")?;
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let text = self
            .http
            .post_json(&url, &request)
            .map_err(|e| DocQaError::EmbeddingUnavailable(e.to_string()))?;

        let mut response: EmbeddingResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::EmbeddingUnavailable(format!("Failed to parse embedding response: {}", e))
        })?;

        if response.data.len() != texts.len() {
            return Err(DocQaError::EmbeddingUnavailable(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        debug!(
            "Generated {} embeddings with {} dimensions",
            response.data.len(),
            response.data.first().map_or(0, |d| d.embedding.len())
        );

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Generator for OpenAiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint("chat/completions")?;
        let body = ChatRequest {
            model: &self.generation_model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let text = self
            .http
            .post_json(&url, &body)
            .map_err(|e| DocQaError::GenerationUnavailable(e.to_string()))?;

        let response: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            DocQaError::GenerationUnavailable(format!("Failed to parse completion response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DocQaError::GenerationUnavailable("Completion response had no content".to_string())
            })
    }
}
