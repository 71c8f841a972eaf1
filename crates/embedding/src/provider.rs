use async_trait::async_trait;

/// Embedding mode determines how text is formatted before embedding.
///
/// Retrieval models such as nomic-embed-text are trained with different task
/// prefixes for stored passages and for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingMode {
  /// Embedding a chunk for the index.
  #[default]
  Document,
  /// Embedding a question for retrieval.
  Query,
}

/// An external embedding service.
///
/// `embed_batch` returns exactly one vector per input, in input order. A
/// failure fails the whole batch.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  fn name(&self) -> &str;
  fn model_id(&self) -> &str;

  async fn embed_batch(&self, texts: &[&str], mode: EmbeddingMode) -> Result<Vec<Vec<f32>>, EmbeddingError>;

  async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Vec<f32>, EmbeddingError> {
    self
      .embed_batch(&[text], mode)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| EmbeddingError::ProviderError("empty embedding response".to_string()))
  }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
  #[error("Embedding service unavailable: {0}")]
  Unavailable(String),
  #[error("Request failed: {0}")]
  Request(reqwest::Error),
  #[error("Provider error: {0}")]
  ProviderError(String),
  #[error("Request timed out")]
  Timeout,
}

impl EmbeddingError {
  /// Whether the service could not be reached at all
  pub fn is_unavailable(&self) -> bool {
    matches!(self, EmbeddingError::Unavailable(_))
  }
}

impl From<reqwest::Error> for EmbeddingError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_connect() {
      EmbeddingError::Unavailable(e.to_string())
    } else if e.is_timeout() {
      EmbeddingError::Timeout
    } else {
      EmbeddingError::Request(e)
    }
  }
}
