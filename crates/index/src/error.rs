use embedding::EmbeddingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
  #[error("Embedding dimension mismatch at position {position}: expected {expected}, found {found}")]
  DimensionMismatch {
    expected: usize,
    found: usize,
    position: usize,
  },

  #[error("Embedding service returned {found} vectors for {expected} inputs")]
  CountMismatch { expected: usize, found: usize },

  #[error("Embedding service returned an empty vector")]
  EmptyVector,

  #[error("Nothing to index")]
  Empty,

  #[error("Embedding: {0}")]
  Embedding(#[from] EmbeddingError),

  #[error("Corrupt vector store: {0}")]
  Corrupt(String),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
