//! Fixed-window text chunking.
//!
//! Each page is cut into windows of `chunk_size` characters that start every
//! `chunk_size - overlap` characters. A page stops producing windows once one
//! reaches the end of its text, so a tail that is entirely overlap never becomes
//! a chunk of its own. Windows ignore word and sentence boundaries; the last
//! window of a page may be shorter.

use crate::{Chunk, Error, Page, Result};
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 100;

/// Parameters for chunking pages (both in characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
  pub chunk_size: usize,
  pub overlap: usize,
}

impl Default for ChunkParams {
  fn default() -> Self {
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      overlap: DEFAULT_OVERLAP,
    }
  }
}

impl ChunkParams {
  pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
    let params = Self { chunk_size, overlap };
    params.validate()?;
    Ok(params)
  }

  /// Requires `0 <= overlap < chunk_size`
  pub fn validate(&self) -> Result<()> {
    if self.chunk_size == 0 {
      return Err(Error::Configuration("chunk_size must be greater than zero".to_string()));
    }
    if self.overlap >= self.chunk_size {
      return Err(Error::Configuration(format!(
        "overlap ({}) must be smaller than chunk_size ({})",
        self.overlap, self.chunk_size
      )));
    }
    Ok(())
  }

  fn stride(&self) -> usize {
    self.chunk_size - self.overlap
  }
}

/// Split pages into overlapping chunks.
///
/// `chunk_id` is a single counter across all pages, starting at 0 and
/// assigned in emission order.
pub fn chunk_pages(pages: &[Page], params: &ChunkParams) -> Result<Vec<Chunk>> {
  params.validate()?;

  let mut chunks = Vec::new();
  for page in pages {
    if page.page_number == 0 {
      return Err(Error::Input("page numbers start at 1".to_string()));
    }
    // Byte offset of every char boundary, plus the end of the text
    let bounds: Vec<usize> = page
      .text
      .char_indices()
      .map(|(b, _)| b)
      .chain(std::iter::once(page.text.len()))
      .collect();
    let char_len = bounds.len() - 1;

    let mut start = 0;
    while start < char_len {
      let end = (start + params.chunk_size).min(char_len);
      chunks.push(Chunk {
        chunk_id: chunks.len(),
        text: page.text[bounds[start]..bounds[end]].to_string(),
        page_number: page.page_number,
        start_char: start,
      });
      if end == char_len {
        break;
      }
      start += params.stride();
    }
  }

  debug!(
    pages = pages.len(),
    chunks = chunks.len(),
    chunk_size = params.chunk_size,
    overlap = params.overlap,
    "Chunked pages"
  );

  Ok(chunks)
}
