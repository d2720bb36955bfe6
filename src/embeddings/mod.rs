// Embeddings module
// Text chunking and the embedding capability used to index chunks


pub mod chunking;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::{DocQaError, Result};

pub use chunking::{Chunk, ChunkingConfig, split_text};

/// Maps text into a fixed-dimension vector space.
///
/// Implementations must be deterministic for identical input and model
/// configuration. Transport, auth and quota failures are reported as
/// [`DocQaError::EmbeddingUnavailable`] and are never retried by callers.
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in input order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Settings for embedding document chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Number of texts sent per `embed_batch` call
    pub batch_size: usize,
    /// Sub-batches embedded at the same time
    pub max_concurrent_batches: usize,
}

impl Default for EmbeddingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            batch_size: 64,
            max_concurrent_batches: 4,
        }
    }
}

impl EmbeddingConfig {
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(1..=2048).contains(&self.batch_size) {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(1..=64).contains(&self.max_concurrent_batches) {
            return Err(ConfigError::InvalidConcurrency(
                self.max_concurrent_batches,
            ));
        }

        Ok(())
    }
}

/// Embed `texts` in sub-batches, running up to `max_concurrent_batches` at once.
///
/// Results come back in the order of `texts` regardless of which sub-batch
/// finishes first. The first failing sub-batch fails the whole call.
#[inline]
pub fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    config: &EmbeddingConfig,
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batches: Vec<&[String]> = texts.chunks(config.batch_size.max(1)).collect();
    debug!(
        "Embedding {} texts in {} batches ({} concurrent)",
        texts.len(),
        batches.len(),
        config.max_concurrent_batches
    );

    let results: Vec<Vec<Vec<f32>>> = if config.max_concurrent_batches <= 1 || batches.len() == 1
    {
        batches
            .iter()
            .map(|batch| embed_checked(embedder, batch))
            .collect::<Result<_>>()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_batches.min(batches.len()))
            .build()
            .map_err(|e| {
                DocQaError::Other(anyhow::anyhow!("Failed to start embedding pool: {}", e))
            })?;

        // Indexed parallel collect keeps batch order
        pool.install(|| {
            batches
                .par_iter()
                .map(|batch| embed_checked(embedder, batch))
                .collect::<Result<_>>()
        })?
    };

    let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();
    debug!("Generated {} embeddings total", vectors.len());
    Ok(vectors)
}

fn embed_checked(embedder: &dyn Embedder, batch: &[String]) -> Result<Vec<Vec<f32>>> {
    let vectors = embedder.embed_batch(batch)?;

    if vectors.len() != batch.len() {
        return Err(DocQaError::EmbeddingUnavailable(format!(
            "Mismatch between request and response counts: {} vs {}",
            batch.len(),
            vectors.len()
        )));
    }

    Ok(vectors)
}
