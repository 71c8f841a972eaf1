//! Ask a question against the on-disk store

use anyhow::{Context, Result};
use daemon::build_orchestrator;
use index::{DurableStore, VectorIndex};
use sourcely_core::Config;

/// Answer a question from the last ingested document
pub async fn cmd_ask(config: &Config, question: &str, k: Option<usize>, json_output: bool) -> Result<()> {
  let orchestrator = build_orchestrator(config)?;
  let stored = DurableStore::default().load().context("Failed to load vector store")?;
  let k = k.unwrap_or(config.retrieval.default_k);

  let answer = match &stored {
    Some((chunks, index)) => {
      orchestrator
        .answer(question, chunks, Some(index as &dyn VectorIndex), k)
        .await?
    }
    None => orchestrator.answer(question, &[], None, k).await?,
  };

  if json_output {
    println!("{}", serde_json::to_string_pretty(&answer)?);
    return Ok(());
  }

  println!("{}\n", answer.answer);
  if !answer.grounded {
    println!("(No retrieved chunk was cited; verify this answer against the document.)\n");
  }
  if !answer.citations.is_empty() {
    println!("Sources:");
    for citation in &answer.citations {
      println!(
        "  [Chunk {}] page {}: {}",
        citation.chunk_id,
        citation.page_number,
        citation.excerpt.replace('\n', " ")
      );
    }
  }
  Ok(())
}
