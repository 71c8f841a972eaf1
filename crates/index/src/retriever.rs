use sourcely_core::{Chunk, RetrievalResult};
use tracing::{debug, warn};

use crate::{Result, VectorIndex};

pub const DEFAULT_K: usize = 5;

/// Nearest chunks to `query`, closest first.
///
/// Index positions map back to `chunks` by ordinal. With no index there is
/// nothing to search and the result is empty.
pub fn retrieve(
  chunks: &[Chunk],
  index: Option<&dyn VectorIndex>,
  query: &[f32],
  k: usize,
) -> Result<Vec<RetrievalResult>> {
  let Some(index) = index else {
    return Ok(Vec::new());
  };

  let neighbors = index.search(query, k)?;
  let mut results = Vec::with_capacity(neighbors.len());
  for neighbor in neighbors {
    match chunks.get(neighbor.position) {
      Some(chunk) => results.push(RetrievalResult::from_chunk(chunk, neighbor.distance)),
      None => warn!(
        position = neighbor.position,
        chunks = chunks.len(),
        "Index position has no chunk, skipping"
      ),
    }
  }

  debug!(k, returned = results.len(), "Retrieved chunks");
  Ok(results)
}
