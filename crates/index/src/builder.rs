use std::sync::Arc;

use embedding::{EmbeddingMode, EmbeddingProvider};
use sourcely_core::Chunk;
use tracing::{debug, info};

use crate::{FlatL2Index, IndexError, Result, VectorIndex};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Embeds chunks and builds an exact L2 index over them.
///
/// Batches are sent one after another. The first batch fixes the dimension;
/// any later vector of a different length aborts the build.
pub struct IndexBuilder {
  provider: Arc<dyn EmbeddingProvider>,
  batch_size: usize,
}

impl IndexBuilder {
  pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
    Self {
      provider,
      batch_size: DEFAULT_BATCH_SIZE,
    }
  }

  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size.max(1);
    self
  }

  /// Build an index whose position `i` holds the embedding of `chunks[i]`
  pub async fn build(&self, chunks: &[Chunk]) -> Result<FlatL2Index> {
    if chunks.is_empty() {
      return Err(IndexError::Empty);
    }

    let batches = chunks.len().div_ceil(self.batch_size);
    info!(
      chunks = chunks.len(),
      batches,
      provider = self.provider.name(),
      model = self.provider.model_id(),
      "Building vector index"
    );

    let mut index: Option<FlatL2Index> = None;
    for (batch_idx, batch) in chunks.chunks(self.batch_size).enumerate() {
      let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
      let vectors = self.provider.embed_batch(&texts, EmbeddingMode::Document).await?;

      if vectors.len() != texts.len() {
        return Err(IndexError::CountMismatch {
          expected: texts.len(),
          found: vectors.len(),
        });
      }

      let index = match index.as_mut() {
        Some(index) => index,
        None => {
          let dimension = vectors[0].len();
          if dimension == 0 {
            return Err(IndexError::EmptyVector);
          }
          index.insert(FlatL2Index::new(dimension))
        }
      };
      index.add(vectors)?;

      debug!(batch = batch_idx + 1, batches, indexed = index.len(), "Embedded batch");
    }

    let index = index.ok_or(IndexError::Empty)?;
    info!(vectors = index.len(), dimension = index.dimension(), "Vector index built");
    Ok(index)
  }
}
