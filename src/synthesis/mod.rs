
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;
use crate::config::ConfigError;
use crate::embeddings::Chunk;

/// Returned instead of calling the model when no chunk was retrieved
pub const INSUFFICIENT_CONTEXT_RESPONSE: &str =
    "I could not find any content in the document that answers this question.";

/// Sampling temperature for every generation call, fixed for reproducible answers
pub const GENERATION_TEMPERATURE: f32 = 0.0;

const PROMPT_INSTRUCTIONS: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// A single prompt sent to the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Produces text from a prompt.
///
/// Transport, auth and quota failures are reported as
/// [`crate::DocQaError::GenerationUnavailable`] and are never retried by callers.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Settings for the answer step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on the length of a generated answer
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_output_tokens: 1000,
        }
    }
}

impl GenerationConfig {
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(1..=32768).contains(&self.max_output_tokens) {
            return Err(ConfigError::InvalidMaxOutputTokens(
                self.max_output_tokens,
            ));
        }
        Ok(())
    }
}

/// Turns retrieved chunks and a question into an answer
#[derive(Debug, Clone)]
pub struct AnswerSynthesizer {
    max_output_tokens: u32,
}

impl AnswerSynthesizer {
    #[inline]
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Answer `question` from `context_chunks`, given nearest first.
    ///
    /// Without context the model is not called and
    /// [`INSUFFICIENT_CONTEXT_RESPONSE`] is returned.
    #[inline]
    pub fn synthesize(
        &self,
        question: &str,
        context_chunks: &[Chunk],
        generator: &dyn Generator,
    ) -> Result<String> {
        Ok(self
            .generate_answer(question, context_chunks, generator)?
            .unwrap_or_else(|| INSUFFICIENT_CONTEXT_RESPONSE.to_string()))
    }

    /// Like [`Self::synthesize`], but returns `None` when there was no
    /// context and the model was not called
    #[inline]
    pub fn generate_answer(
        &self,
        question: &str,
        context_chunks: &[Chunk],
        generator: &dyn Generator,
    ) -> Result<Option<String>> {
        if context_chunks.is_empty() {
            info!("No context retrieved, skipping generation");
            return Ok(None);
        }

        let request = GenerationRequest {
            prompt: build_prompt(question, context_chunks),
            temperature: GENERATION_TEMPERATURE,
            max_output_tokens: self.max_output_tokens,
        };

        debug!(
            "Generating answer from {} chunks (prompt length: {})",
            context_chunks.len(),
            request.prompt.len()
        );

        let answer = generator.generate(&request)?;
        Ok(Some(answer.trim().to_string()))
    }
}

/// Build the prompt: instructions, every chunk in the given order, then the question
#[inline]
pub fn build_prompt(question: &str, context_chunks: &[Chunk]) -> String {
    let context = context_chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        PROMPT_INSTRUCTIONS, context, question
    )
}
