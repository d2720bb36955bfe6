
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::embeddings::{Chunk, Embedder};
use crate::index::{DistanceMetric, VectorIndex};
use crate::{DocQaError, Result};

/// Settings for the similarity search step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer step
    pub top_k: usize,
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: DistanceMetric::default(),
        }
    }
}

impl RetrievalConfig {
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }
        Ok(())
    }
}

/// Finds the chunks most relevant to a question.
///
/// Every call embeds the question afresh; nothing is cached between questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retriever;

impl Retriever {
    /// Embed `question` and return up to `k` nearest chunks, nearest first.
    ///
    /// An index without entries yields an empty list rather than an error.
    #[inline]
    pub fn retrieve(
        &self,
        question: &str,
        index: &VectorIndex,
        embedder: &dyn Embedder,
        k: usize,
    ) -> Result<Vec<Chunk>> {
        let query_vector = embedder.embed(question)?;

        match index.query(&query_vector, k) {
            Ok(results) => {
                debug!(
                    "Retrieved {} chunks (nearest distance {:?})",
                    results.len(),
                    results.first().map(|r| r.distance)
                );
                Ok(results.into_iter().map(|r| r.chunk).collect())
            }
            Err(DocQaError::EmptyIndex) => {
                debug!("Index is empty, no context to retrieve");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
