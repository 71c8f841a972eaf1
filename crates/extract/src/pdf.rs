use lopdf::Document;
use sourcely_core::Page;
use tracing::{debug, info, warn};

use crate::{DocumentExtractor, ExtractError};

/// Text extraction for PDFs.
///
/// Only text drawn with text operators is recovered; scanned pages come back
/// blank and are dropped. Page numbers are positions in the source document,
/// so a dropped page leaves a gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
  fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::InvalidDocument(e.to_string()))?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_number in &page_numbers {
      let text = match document.extract_text(&[*page_number]) {
        Ok(text) => text,
        Err(e) => {
          warn!(page = page_number, err = %e, "Failed to extract page text, skipping");
          continue;
        }
      };

      let text = text.trim();
      if text.is_empty() {
        debug!(page = page_number, "Skipping blank page");
        continue;
      }
      pages.push(Page::new(*page_number, text));
    }

    info!(
      total_pages = page_numbers.len(),
      text_pages = pages.len(),
      "Extracted PDF text"
    );
    Ok(pages)
  }
}
