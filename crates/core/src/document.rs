use serde::{Deserialize, Serialize};

/// Number of characters of chunk text carried in a citation excerpt
pub const EXCERPT_CHARS: usize = 150;

/// A page of extracted document text (1-based page number, never blank)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub page_number: u32,
  pub text: String,
}

impl Page {
  pub fn new(page_number: u32, text: impl Into<String>) -> Self {
    Self {
      page_number,
      text: text.into(),
    }
  }
}

/// A fixed-size window of page text with a stable identity
///
/// `start_char` counts characters, not bytes, from the start of the page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
  pub chunk_id: usize,
  pub text: String,
  pub page_number: u32,
  pub start_char: usize,
}

/// A chunk returned by a nearest-neighbor query
///
/// Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
  pub chunk_id: usize,
  pub text: String,
  pub page_number: u32,
  pub distance: f32,
}

impl RetrievalResult {
  pub fn from_chunk(chunk: &Chunk, distance: f32) -> Self {
    Self {
      chunk_id: chunk.chunk_id,
      text: chunk.text.clone(),
      page_number: chunk.page_number,
      distance,
    }
  }
}

/// A resolved `[Chunk X]` reference from a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
  pub chunk_id: usize,
  pub page_number: u32,
  pub excerpt: String,
}

impl Citation {
  pub fn from_result(result: &RetrievalResult) -> Self {
    Self {
      chunk_id: result.chunk_id,
      page_number: result.page_number,
      excerpt: result.text.chars().take(EXCERPT_CHARS).collect(),
    }
  }
}

/// Output of the question-answering pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
  pub answer: String,
  pub citations: Vec<Citation>,
  pub retrieved_chunks: Vec<RetrievalResult>,
  /// False when a model answer cites nothing that was retrieved
  pub grounded: bool,
}

impl Answer {
  /// A fixed answer with no supporting material.
  ///
  /// Fixed replies make no claim about the document, so they count as grounded.
  pub fn sentinel(text: &str) -> Self {
    Self {
      answer: text.to_string(),
      citations: Vec::new(),
      retrieved_chunks: Vec::new(),
      grounded: true,
    }
  }
}
