//! Deterministic stand-ins for the embedding and generation services

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::Embedder;
use crate::synthesis::{GenerationRequest, Generator};
use crate::{DocQaError, Result};

/// Embeds text as lowercase letter frequencies (26 dimensions)
#[derive(Default)]
pub struct LetterEmbedder {
    calls: AtomicUsize,
}

impl LetterEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for LetterEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0; 26];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(vector)
    }
}

/// Returns fixed vectors for known texts and a fallback for everything else
pub struct MapEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
}

impl MapEmbedder {
    pub fn new(vectors: &[(&str, Vec<f32>)], fallback: Vec<f32>) -> Self {
        Self {
            vectors: vectors
                .iter()
                .map(|(text, vector)| ((*text).to_string(), vector.clone()))
                .collect(),
            fallback,
        }
    }
}

impl Embedder for MapEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(DocQaError::EmbeddingUnavailable(
            "connection refused".to_string(),
        ))
    }
}

/// Answers every prompt with a fixed string and records what it was asked
pub struct RecordingGenerator {
    answer: String,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(self.answer.clone())
    }
}

pub struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(DocQaError::GenerationUnavailable(
            "HTTP 429: rate limited".to_string(),
        ))
    }
}
