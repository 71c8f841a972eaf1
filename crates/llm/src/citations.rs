//! Resolution of `[Chunk X]` markers in generated answers.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use sourcely_core::{Citation, RetrievalResult};
use tracing::debug;

use crate::NOT_FOUND_ANSWER;

static CHUNK_MARKER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[Chunk (\d+)\]").expect("chunk marker pattern is valid"));

/// Citations for every distinct chunk id referenced in `answer` that is
/// present in `results`, sorted by chunk id.
///
/// Ids the model invented, or that were not retrieved for this answer, are
/// dropped. When `results` repeats an id the first entry wins.
pub fn extract_citations(answer: &str, results: &[RetrievalResult]) -> Vec<Citation> {
  let referenced: BTreeSet<usize> = CHUNK_MARKER
    .captures_iter(answer)
    .filter_map(|caps| caps[1].parse().ok())
    .collect();

  let citations: Vec<Citation> = referenced
    .iter()
    .filter_map(|id| results.iter().find(|r| r.chunk_id == *id))
    .map(Citation::from_result)
    .collect();

  if citations.len() < referenced.len() {
    debug!(
      referenced = referenced.len(),
      resolved = citations.len(),
      "Dropped citations for chunks that were not retrieved"
    );
  }
  citations
}

/// An answer that is neither the not-found reply nor backed by any
/// resolved citation
pub fn is_ungrounded(answer: &str, citations: &[Citation]) -> bool {
  citations.is_empty() && answer.trim() != NOT_FOUND_ANSWER
}
