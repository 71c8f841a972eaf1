use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sourcely_core::EmbeddingConfig;
use tracing::{debug, trace, warn};

use crate::{EmbeddingError, EmbeddingMode, EmbeddingProvider};

/// Embeddings from a local Ollama server via the batch `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaProvider {
  client: reqwest::Client,
  base_url: String,
  model: String,
  document_prefix: String,
  query_prefix: String,
  timeout: Duration,
}

impl OllamaProvider {
  pub fn new(config: &EmbeddingConfig) -> Self {
    debug!(
      base_url = %config.ollama_url,
      model = %config.model,
      "Ollama embedding provider initialized"
    );
    Self {
      client: reqwest::Client::new(),
      base_url: config.ollama_url.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      document_prefix: config.document_prefix.clone(),
      query_prefix: config.query_prefix.clone(),
      timeout: Duration::from_secs(config.timeout_secs),
    }
  }

  fn embed_url(&self) -> String {
    format!("{}/api/embed", self.base_url)
  }

  /// Prepend the task prefix for the given mode
  fn format_for_embedding(&self, text: &str, mode: EmbeddingMode) -> String {
    let prefix = match mode {
      EmbeddingMode::Document => &self.document_prefix,
      EmbeddingMode::Query => &self.query_prefix,
    };
    format!("{}{}", prefix, text)
  }
}

#[derive(Debug, Serialize)]
struct BatchEmbeddingRequest<'a> {
  model: &'a str,
  input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbeddingResponse {
  embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
  fn name(&self) -> &str {
    "ollama"
  }

  fn model_id(&self) -> &str {
    &self.model
  }

  #[tracing::instrument(level = "trace", skip(self, texts), fields(batch_size = texts.len()))]
  async fn embed_batch(&self, texts: &[&str], mode: EmbeddingMode) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let request = BatchEmbeddingRequest {
      model: &self.model,
      input: texts.iter().map(|t| self.format_for_embedding(t, mode)).collect(),
    };

    let start = Instant::now();
    let response = self
      .client
      .post(self.embed_url())
      .timeout(self.timeout)
      .json(&request)
      .send()
      .await?;

    trace!(
      status = %response.status(),
      elapsed_ms = start.elapsed().as_millis(),
      "Received batch embedding response"
    );

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      warn!(status = %status, batch_size = texts.len(), model = %self.model, "Ollama embedding failed");
      return Err(EmbeddingError::ProviderError(format!(
        "Ollama returned {}: {}",
        status, body
      )));
    }

    let result: BatchEmbeddingResponse = response.json().await?;

    if result.embeddings.len() != texts.len() {
      return Err(EmbeddingError::ProviderError(format!(
        "Ollama returned {} embeddings for {} inputs",
        result.embeddings.len(),
        texts.len()
      )));
    }

    Ok(result.embeddings)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_provider_from_config() {
    let config = EmbeddingConfig {
      ollama_url: "http://custom:8080/".to_string(),
      model: "custom-model".to_string(),
      ..Default::default()
    };
    let provider = OllamaProvider::new(&config);

    assert_eq!(provider.name(), "ollama");
    assert_eq!(provider.model_id(), "custom-model");
    assert_eq!(provider.embed_url(), "http://custom:8080/api/embed");
  }

  #[test]
  fn test_format_for_embedding_uses_mode_prefix() {
    let provider = OllamaProvider::new(&EmbeddingConfig::default());
    assert_eq!(
      provider.format_for_embedding("a passage", EmbeddingMode::Document),
      "search_document: a passage"
    );
    assert_eq!(
      provider.format_for_embedding("a question?", EmbeddingMode::Query),
      "search_query: a question?"
    );
  }

  #[test]
  fn test_empty_prefixes() {
    let config = EmbeddingConfig {
      document_prefix: String::new(),
      query_prefix: String::new(),
      ..Default::default()
    };
    let provider = OllamaProvider::new(&config);
    assert_eq!(provider.format_for_embedding("text", EmbeddingMode::Query), "text");
  }

  #[tokio::test]
  async fn test_unreachable_server_is_unavailable() {
    // Grab a free port and release it so nothing is listening there
    let port = {
      let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
      listener.local_addr().unwrap().port()
    };
    let config = EmbeddingConfig {
      ollama_url: format!("http://127.0.0.1:{}", port),
      ..Default::default()
    };
    let provider = OllamaProvider::new(&config);

    let err = provider.embed_batch(&["hello"], EmbeddingMode::Document).await.unwrap_err();
    assert!(err.is_unavailable(), "expected unavailable, got {:?}", err);
  }

  #[tokio::test]
  async fn test_silent_server_times_out() {
    // Accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let mut held = Vec::new();
      while let Ok((socket, _)) = listener.accept().await {
        held.push(socket);
      }
    });

    let config = EmbeddingConfig {
      ollama_url: format!("http://{}", addr),
      timeout_secs: 1,
      ..Default::default()
    };
    let provider = OllamaProvider::new(&config);

    let err = provider.embed_batch(&["hello"], EmbeddingMode::Query).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Timeout), "expected timeout, got {:?}", err);
  }

  #[tokio::test]
  async fn test_empty_batch_skips_request() {
    let config = EmbeddingConfig {
      ollama_url: "http://127.0.0.1:9".to_string(),
      ..Default::default()
    };
    let provider = OllamaProvider::new(&config);
    let embeddings = provider.embed_batch(&[], EmbeddingMode::Document).await.unwrap();
    assert!(embeddings.is_empty());
  }

  // Integration test requires a running Ollama instance
  #[tokio::test]
  async fn test_embed_batch_live() {
    let provider = OllamaProvider::new(&EmbeddingConfig::default());

    let embeddings = match provider.embed_batch(&["Hello", "World"], EmbeddingMode::Document).await {
      Ok(e) => e,
      Err(e) => {
        eprintln!("Ollama not available, skipping test: {}", e);
        return;
      }
    };

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[0].len(), embeddings[1].len());
  }
}
