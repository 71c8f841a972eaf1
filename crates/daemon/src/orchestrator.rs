//! The ingest and question-answering pipelines.
//!
//! Ingest: extract, chunk, embed, build an index. Answer: embed the question,
//! retrieve, prompt, generate, resolve citations. Collaborator failures are
//! reported as-is; nothing is retried.

use std::sync::Arc;

use embedding::{EmbeddingError, EmbeddingMode, EmbeddingProvider};
use extract::{DocumentExtractor, ExtractError};
use index::{FlatL2Index, IndexBuilder, IndexError, VectorIndex, retrieve};
use llm::{GenerationProvider, LlmError, build_answer_prompt, extract_citations, is_ungrounded};
use sourcely_core::{Answer, Chunk, ChunkParams, Page, chunk_pages};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sessions::Session;

/// Reply when a question arrives before any document was indexed
pub const NO_DOCUMENTS_ANSWER: &str = "No documents have been indexed yet. Upload a PDF first.";

/// Characters of the first page echoed back after an upload
pub const PREVIEW_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum IngestError {
  #[error("Invalid document: {0}")]
  Extract(#[from] ExtractError),
  #[error("No text found in document")]
  NoText,
  #[error("Configuration error: {0}")]
  Configuration(String),
  #[error("Service unavailable: {0}")]
  ServiceUnavailable(String),
  #[error("Index build failed: {0}")]
  Index(IndexError),
  #[error("Extraction task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl From<IndexError> for IngestError {
  fn from(e: IndexError) -> Self {
    match e {
      IndexError::Embedding(e) if e.is_unavailable() => IngestError::ServiceUnavailable(e.to_string()),
      IndexError::Empty => IngestError::NoText,
      other => IngestError::Index(other),
    }
  }
}

impl From<sourcely_core::Error> for IngestError {
  fn from(e: sourcely_core::Error) -> Self {
    match e {
      sourcely_core::Error::Input(msg) => IngestError::Extract(ExtractError::InvalidDocument(msg)),
      other => IngestError::Configuration(other.to_string()),
    }
  }
}

#[derive(Error, Debug)]
pub enum AnswerError {
  #[error("Invalid input: {0}")]
  Input(String),
  #[error("Service unavailable: {0}")]
  ServiceUnavailable(String),
  #[error("Embedding failed: {0}")]
  Embedding(EmbeddingError),
  #[error("Retrieval failed: {0}")]
  Index(#[from] IndexError),
  #[error("Generation failed: {0}")]
  Generation(LlmError),
}

impl From<EmbeddingError> for AnswerError {
  fn from(e: EmbeddingError) -> Self {
    if e.is_unavailable() {
      AnswerError::ServiceUnavailable(e.to_string())
    } else {
      AnswerError::Embedding(e)
    }
  }
}

impl From<LlmError> for AnswerError {
  fn from(e: LlmError) -> Self {
    if e.is_unavailable() {
      AnswerError::ServiceUnavailable(e.to_string())
    } else {
      AnswerError::Generation(e)
    }
  }
}

/// Chunks and index built from one document
#[derive(Debug, Clone)]
pub struct IngestedDocument {
  pub chunks: Vec<Chunk>,
  pub index: FlatL2Index,
  pub num_pages: usize,
  /// Opening text of the first non-blank page
  pub preview: String,
}

/// Wires the collaborators into the two pipelines
pub struct Orchestrator {
  extractor: Arc<dyn DocumentExtractor>,
  embedding: Arc<dyn EmbeddingProvider>,
  generator: Arc<dyn GenerationProvider>,
  chunk_params: ChunkParams,
  batch_size: usize,
}

impl Orchestrator {
  pub fn new(
    extractor: Arc<dyn DocumentExtractor>,
    embedding: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
  ) -> Self {
    Self {
      extractor,
      embedding,
      generator,
      chunk_params: ChunkParams::default(),
      batch_size: index::DEFAULT_BATCH_SIZE,
    }
  }

  pub fn with_chunk_params(mut self, params: ChunkParams) -> Self {
    self.chunk_params = params;
    self
  }

  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  /// Extract, chunk and index a raw document
  pub async fn ingest(&self, bytes: Vec<u8>) -> Result<IngestedDocument, IngestError> {
    let extractor = Arc::clone(&self.extractor);
    let pages = tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await??;
    self.ingest_pages(&pages).await
  }

  /// Chunk and index already-extracted pages
  pub async fn ingest_pages(&self, pages: &[Page]) -> Result<IngestedDocument, IngestError> {
    if pages.is_empty() {
      return Err(IngestError::NoText);
    }

    let chunks = chunk_pages(pages, &self.chunk_params)?;
    if chunks.is_empty() {
      return Err(IngestError::NoText);
    }

    let index = IndexBuilder::new(Arc::clone(&self.embedding))
      .with_batch_size(self.batch_size)
      .build(&chunks)
      .await?;

    info!(pages = pages.len(), chunks = chunks.len(), "Ingested document");
    Ok(IngestedDocument {
      chunks,
      index,
      num_pages: pages.len(),
      preview: pages[0].text.chars().take(PREVIEW_CHARS).collect(),
    })
  }

  /// Answer `question` from a session's document
  pub async fn answer_session(&self, question: &str, session: &Session, k: usize) -> Result<Answer, AnswerError> {
    self.answer(question, &session.chunks, session.vector_index(), k).await
  }

  /// Answer `question` from `chunks` and the index built over them
  pub async fn answer(
    &self,
    question: &str,
    chunks: &[Chunk],
    index: Option<&dyn VectorIndex>,
    k: usize,
  ) -> Result<Answer, AnswerError> {
    // Without an index there is nothing to validate against
    let Some(index) = index else {
      debug!("No index for question, answering with no-documents reply");
      return Ok(Answer::sentinel(NO_DOCUMENTS_ANSWER));
    };

    if question.trim().is_empty() {
      return Err(AnswerError::Input("question must not be empty".to_string()));
    }
    if k == 0 {
      return Err(AnswerError::Input("k must be greater than zero".to_string()));
    }

    let query = self.embedding.embed(question, EmbeddingMode::Query).await?;
    let results = retrieve(chunks, Some(index), &query, k)?;
    if results.is_empty() {
      debug!("Nothing retrieved, answering with no-documents reply");
      return Ok(Answer::sentinel(NO_DOCUMENTS_ANSWER));
    }

    let prompt = build_answer_prompt(question, &results);
    let text = self.generator.generate(&prompt).await?;
    let citations = extract_citations(&text, &results);

    let grounded = !is_ungrounded(&text, &citations);
    if !grounded {
      warn!(
        retrieved = results.len(),
        model = self.generator.model_id(),
        "Answer carries no resolvable citations"
      );
    }
    debug!(retrieved = results.len(), citations = citations.len(), "Answered question");

    Ok(Answer {
      answer: text,
      citations,
      retrieved_chunks: results,
      grounded,
    })
  }
}
