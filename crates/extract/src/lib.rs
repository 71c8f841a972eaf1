mod pdf;

pub use pdf::PdfExtractor;
use sourcely_core::Page;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
  #[error("Invalid document: {0}")]
  InvalidDocument(String),
}

/// Turns raw document bytes into ordered, non-blank pages
pub trait DocumentExtractor: Send + Sync {
  fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractError>;
}
