use std::net::SocketAddr;
use std::sync::Arc;

use embedding::{EmbeddingProvider, OllamaProvider};
use extract::PdfExtractor;
use llm::{GenerationProvider, OllamaGenerator};
use sourcely_core::{Config, EmbeddingConfig, GenerationConfig};
use thiserror::Error;
use tracing::info;

use crate::orchestrator::Orchestrator;
use crate::server::{self, AppState};

#[derive(Error, Debug)]
pub enum LifecycleError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Configuration error: {0}")]
  Config(#[from] sourcely_core::Error),
  #[error("Invalid bind address '{0}'")]
  InvalidBind(String),
}

/// Create an embedding provider from config
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
  Arc::new(OllamaProvider::new(config))
}

/// Create a generation provider from config
pub fn create_generation_provider(config: &GenerationConfig) -> Arc<dyn GenerationProvider> {
  Arc::new(OllamaGenerator::new(config))
}

/// Build the pipelines with the configured collaborators
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator, LifecycleError> {
  config.validate()?;
  let orchestrator = Orchestrator::new(
    Arc::new(PdfExtractor),
    create_embedding_provider(&config.embedding),
    create_generation_provider(&config.generation),
  )
  .with_chunk_params(config.chunking.params()?)
  .with_batch_size(config.embedding.batch_size);
  Ok(orchestrator)
}

/// HTTP server lifecycle
pub struct Daemon {
  config: Config,
}

impl Daemon {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  /// Address the server will bind
  pub fn bind_addr(&self) -> Result<SocketAddr, LifecycleError> {
    let bind = &self.config.server.bind;
    bind.parse().map_err(|_| LifecycleError::InvalidBind(bind.clone()))
  }

  /// Run until ctrl-c
  pub async fn run(self) -> Result<(), LifecycleError> {
    let addr = self.bind_addr()?;
    let orchestrator = build_orchestrator(&self.config)?;

    info!("Starting Sourcely server");
    info!(
      embedding_model = %self.config.embedding.model,
      generation_model = %self.config.generation.model,
      ollama = %self.config.embedding.ollama_url,
      "Using Ollama"
    );
    info!(
      chunk_size = self.config.chunking.chunk_size,
      overlap = self.config.chunking.overlap,
      default_k = self.config.retrieval.default_k,
      max_session_age_secs = self.config.sessions.max_age_secs,
      "Pipeline settings"
    );

    let state = AppState::new(orchestrator, self.config);
    server::serve(state, addr).await?;

    info!("Server shutdown complete");
    Ok(())
  }
}
