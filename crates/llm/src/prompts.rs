//! Prompt assembly for grounded question answering.

use sourcely_core::RetrievalResult;
use tracing::trace;

/// Exact reply the model is told to give when the context does not answer
/// the question
pub const NOT_FOUND_ANSWER: &str = "I could not find the answer to that question in the uploaded document.";

const ANSWER_INSTRUCTIONS: &str = r#"You are a document assistant. Answer the question using ONLY the context chunks below.

Rules:
- Use only information stated in the context. Do not use outside knowledge.
- If the context does not contain the answer, reply with exactly:
  "I could not find the answer to that question in the uploaded document."
- After every factual claim, cite the chunk it came from as [Chunk X], where X is the exact number shown in that chunk's label.
- If a claim is supported by more than one chunk, cite each of them, e.g. [Chunk 2][Chunk 5].
- Be direct. No greetings, no filler, no restating the question."#;

/// Render the labeled context block for one retrieved chunk
fn format_chunk(result: &RetrievalResult) -> String {
  format!("[Chunk {}]\n{}", result.chunk_id, result.text)
}

/// Build the generation prompt for `question` over `results`, in the given
/// order. Identical inputs always produce an identical string.
pub fn build_answer_prompt(question: &str, results: &[RetrievalResult]) -> String {
  let context = results.iter().map(format_chunk).collect::<Vec<_>>().join("\n\n");

  let prompt = format!(
    "{}\n\nContext:\n\n{}\n\nQuestion: {}\n\nAnswer:",
    ANSWER_INSTRUCTIONS, context, question
  );
  trace!(chunks = results.len(), prompt_len = prompt.len(), "Built answer prompt");
  prompt
}

#[cfg(test)]
mod tests {
  use super::*;

  fn result(chunk_id: usize, text: &str) -> RetrievalResult {
    RetrievalResult {
      chunk_id,
      text: text.to_string(),
      page_number: 1,
      distance: 0.5,
    }
  }

  #[test]
  fn test_prompt_is_deterministic() {
    let results = vec![result(3, "Refunds take 5 days."), result(1, "Shipping is free.")];
    let a = build_answer_prompt("How long do refunds take?", &results);
    let b = build_answer_prompt("How long do refunds take?", &results);
    assert_eq!(a, b);
  }

  #[test]
  fn test_blocks_keep_order_and_ids() {
    let results = vec![result(3, "Refunds take 5 days."), result(1, "Shipping is free.")];
    let prompt = build_answer_prompt("q", &results);

    assert!(prompt.contains("[Chunk 3]\nRefunds take 5 days.\n\n[Chunk 1]\nShipping is free."));
    let first = prompt.find("[Chunk 3]\n").unwrap();
    let second = prompt.find("[Chunk 1]\n").unwrap();
    assert!(first < second);
  }

  #[test]
  fn test_question_follows_context() {
    let prompt = build_answer_prompt("What is the warranty?", &[result(0, "Two years.")]);
    let context = prompt.find("[Chunk 0]").unwrap();
    let question = prompt.find("Question: What is the warranty?").unwrap();
    assert!(context < question);
  }

  #[test]
  fn test_instructions_carry_sentinel() {
    let prompt = build_answer_prompt("q", &[]);
    assert!(prompt.contains(NOT_FOUND_ANSWER));
    assert!(prompt.contains("[Chunk X]"));
  }

  #[test]
  fn test_different_inputs_differ() {
    let results = vec![result(0, "Two years.")];
    assert_ne!(build_answer_prompt("a", &results), build_answer_prompt("b", &results));
  }
}
