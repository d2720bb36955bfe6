
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::embeddings::{
    ChunkingConfig, Embedder, EmbeddingConfig, embed_in_batches, split_text,
};
use crate::index::{IndexEntry, VectorIndex};
use crate::retrieval::{RetrievalConfig, Retriever};
use crate::synthesis::{
    AnswerSynthesizer, GenerationConfig, Generator, INSUFFICIENT_CONTEXT_RESPONSE,
};
use crate::{DocQaError, Result};

/// Provider-independent settings, validated once before the pipeline is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

impl PipelineSettings {
    #[inline]
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.retrieval.validate()?;
        self.generation.validate()?;
        Ok(())
    }
}

/// What to show the user for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Answer(String),
    /// Nothing relevant was found in the document
    InsufficientContext,
    /// A service failed; the message is safe to display
    Failed(String),
}

impl Response {
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) | Self::Failed(text) => text,
            Self::InsufficientContext => INSUFFICIENT_CONTEXT_RESPONSE,
        }
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Response {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Wires chunking, embedding, retrieval and answer synthesis together
pub struct Pipeline {
    settings: PipelineSettings,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    synthesizer: AnswerSynthesizer,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    #[inline]
    pub fn new(
        settings: PipelineSettings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        settings.validate()?;
        let synthesizer = AnswerSynthesizer::new(&settings.generation);

        Ok(Self {
            settings,
            embedder,
            generator,
            synthesizer,
        })
    }

    #[inline]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Chunk, embed and index a document's text.
    ///
    /// Text without any content yields a session whose every answer is the
    /// insufficient-context response.
    #[inline]
    pub fn load_document(&self, text: &str) -> Result<Session<'_>> {
        let chunks = split_text(text, &self.settings.chunking)?;
        info!("Indexing document: {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), &texts, &self.settings.embedding)?;

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        let metric = self.settings.retrieval.metric;
        let index = match VectorIndex::build(entries, metric) {
            Ok(index) => index,
            Err(DocQaError::EmptyIndex) => {
                info!("Document has no text, every question will lack context");
                VectorIndex::new(metric)
            }
            Err(e) => return Err(e),
        };

        Ok(Session {
            pipeline: self,
            index,
            document_len: text.chars().count(),
        })
    }
}

/// One loaded document, answering any number of questions
#[derive(Debug)]
pub struct Session<'a> {
    pipeline: &'a Pipeline,
    index: VectorIndex,
    document_len: usize,
}

impl Session<'_> {
    /// Answer a question, returning `None` for an empty question.
    ///
    /// Service failures are returned as typed errors.
    #[inline]
    pub fn try_ask(&self, question: &str) -> Result<Option<String>> {
        Ok(self
            .respond(question)?
            .map(|response| response.text().to_string()))
    }

    /// Answer a question for display, returning `None` for an empty question
    #[inline]
    pub fn ask(&self, question: &str) -> Option<Response> {
        match self.respond(question) {
            Ok(response) => response,
            Err(DocQaError::EmptyIndex) => Some(Response::InsufficientContext),
            Err(e) => {
                error!("Failed to answer question: {}", e);
                Some(Response::Failed(e.to_string()))
            }
        }
    }

    fn respond(&self, question: &str) -> Result<Option<Response>> {
        if question.trim().is_empty() {
            debug!("Ignoring empty question");
            return Ok(None);
        }

        let pipeline = self.pipeline;
        let chunks = Retriever.retrieve(
            question,
            &self.index,
            pipeline.embedder.as_ref(),
            pipeline.settings.retrieval.top_k,
        )?;

        let answer = pipeline
            .synthesizer
            .generate_answer(question, &chunks, pipeline.generator.as_ref())?;

        Ok(Some(answer.map_or(Response::InsufficientContext, Response::Answer)))
    }

    /// Number of chunks in the index
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Length of the loaded document in characters
    #[inline]
    pub fn document_len(&self) -> usize {
        self.document_len
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}
