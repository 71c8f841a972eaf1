//! On-disk vector store for single-user command line use.
//!
//! The store lives in one fixed directory and holds at most one document.
//! Saving overwrites whatever was there; there is no per-user isolation, so
//! the HTTP server never uses it.

use std::path::{Path, PathBuf};

use sourcely_core::{Chunk, default_data_dir};
use tracing::{debug, info};

use crate::{FlatL2Index, IndexError, Result, VectorIndex};

const INDEX_FILE: &str = "index.json";
const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Clone)]
pub struct DurableStore {
  dir: PathBuf,
}

impl Default for DurableStore {
  fn default() -> Self {
    Self::new(default_data_dir().join("vector_store"))
  }
}

impl DurableStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn index_path(&self) -> PathBuf {
    self.dir.join(INDEX_FILE)
  }

  fn chunks_path(&self) -> PathBuf {
    self.dir.join(CHUNKS_FILE)
  }

  /// Replace the stored document with `chunks` and `index`
  pub fn save(&self, chunks: &[Chunk], index: &FlatL2Index) -> Result<()> {
    if chunks.len() != index.len() {
      return Err(IndexError::CountMismatch {
        expected: index.len(),
        found: chunks.len(),
      });
    }

    std::fs::create_dir_all(&self.dir)?;
    std::fs::write(self.index_path(), serde_json::to_vec(index)?)?;
    std::fs::write(self.chunks_path(), serde_json::to_vec_pretty(chunks)?)?;

    info!(
      dir = %self.dir.display(),
      chunks = chunks.len(),
      dimension = index.dimension(),
      "Saved vector store"
    );
    Ok(())
  }

  /// Load the stored document, or `None` if nothing has been saved
  pub fn load(&self) -> Result<Option<(Vec<Chunk>, FlatL2Index)>> {
    let index_path = self.index_path();
    let chunks_path = self.chunks_path();
    if !index_path.exists() || !chunks_path.exists() {
      debug!(dir = %self.dir.display(), "No vector store on disk");
      return Ok(None);
    }

    let index: FlatL2Index = serde_json::from_slice(&std::fs::read(&index_path)?)?;
    index.validate()?;
    let chunks: Vec<Chunk> = serde_json::from_slice(&std::fs::read(&chunks_path)?)?;

    if chunks.len() != index.len() {
      return Err(IndexError::Corrupt(format!(
        "{} chunk records for {} vectors",
        chunks.len(),
        index.len()
      )));
    }

    debug!(dir = %self.dir.display(), chunks = chunks.len(), "Loaded vector store");
    Ok(Some((chunks, index)))
  }
}
