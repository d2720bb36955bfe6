#[cfg(test)]
mod tests;

pub mod distance;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::embeddings::Chunk;
use crate::{DocQaError, Result};

/// How distance between two embeddings is measured.
///
/// Euclidean (L2) is the default and matches a flat L2 index. Use cosine for
/// embedding models whose vectors are meant to be compared by angle. Indexes
/// built with different metrics are not comparable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
}

impl DistanceMetric {
    #[inline]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => distance::euclidean_distance(a, b),
            Self::Cosine => distance::cosine_distance(a, b),
        }
    }
}

impl fmt::Display for DistanceMetric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euclidean => f.write_str("euclidean"),
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// A chunk paired with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk returned from a nearest-neighbour query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Exact nearest-neighbour index over the chunks of one document.
///
/// Entries keep their insertion order, which is also the tie-breaker when two
/// entries are equally distant from a query.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metric: DistanceMetric,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// An index with no entries. Queries fail with [`DocQaError::EmptyIndex`].
    #[inline]
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimension: 0,
            entries: Vec::new(),
        }
    }

    /// Build an index from entries in chunk order
    #[inline]
    pub fn build(entries: Vec<IndexEntry>, metric: DistanceMetric) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Err(DocQaError::EmptyIndex);
        };

        let dimension = first.vector.len();
        if let Some(entry) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(DocQaError::DimensionMismatch {
                expected: dimension,
                actual: entry.vector.len(),
            });
        }

        debug!(
            "Built {} index with {} entries of dimension {}",
            metric,
            entries.len(),
            dimension
        );

        Ok(Self {
            metric,
            dimension,
            entries,
        })
    }

    /// Return up to `k` chunks nearest to `vector`, nearest first
    #[inline]
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Err(DocQaError::EmptyIndex);
        }

        if vector.len() != self.dimension {
            return Err(DocQaError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, self.metric.distance(vector, &entry.vector)))
            .collect();

        // Stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, distance)| SearchResult {
                chunk: self.entries[position].chunk.clone(),
                distance,
            })
            .collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}
