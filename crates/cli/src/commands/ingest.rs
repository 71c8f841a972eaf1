//! Index a PDF into the on-disk store

use anyhow::{Context, Result, bail};
use daemon::build_orchestrator;
use index::DurableStore;
use sourcely_core::Config;
use std::path::Path;
use tracing::info;

/// Extract, chunk and embed a PDF, replacing whatever the store held
pub async fn cmd_ingest(config: &Config, path: &Path) -> Result<()> {
  if !path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
  {
    bail!("Only PDF files are allowed: {}", path.display());
  }

  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("Failed to read {}", path.display()))?;
  let orchestrator = build_orchestrator(config)?;

  info!(path = %path.display(), bytes = bytes.len(), "Ingesting document");
  let document = orchestrator.ingest(bytes).await.context("Failed to index document")?;

  let store = DurableStore::default();
  store
    .save(&document.chunks, &document.index)
    .context("Failed to save vector store")?;

  println!(
    "Indexed {}: {} pages, {} chunks",
    path.display(),
    document.num_pages,
    document.chunks.len()
  );
  println!("Store: {}", store.dir().display());
  Ok(())
}
