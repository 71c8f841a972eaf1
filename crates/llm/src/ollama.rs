use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sourcely_core::GenerationConfig;
use tracing::{debug, trace, warn};

use crate::{GenerationProvider, InferenceRequest, InferenceResponse, LlmError, Result};

/// Answer generation via Ollama's non-streaming `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
  client: reqwest::Client,
  base_url: String,
  model: String,
  temperature: f32,
  timeout: Duration,
}

impl OllamaGenerator {
  pub fn new(config: &GenerationConfig) -> Self {
    debug!(
      base_url = %config.ollama_url,
      model = %config.model,
      "Ollama generation provider initialized"
    );
    Self {
      client: reqwest::Client::new(),
      base_url: config.ollama_url.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      temperature: config.temperature,
      timeout: Duration::from_secs(config.timeout_secs),
    }
  }

  fn generate_url(&self) -> String {
    format!("{}/api/generate", self.base_url)
  }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  system: Option<&'a str>,
  stream: bool,
  options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
  temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  response: String,
  #[serde(default)]
  prompt_eval_count: Option<u32>,
  #[serde(default)]
  eval_count: Option<u32>,
  /// Nanoseconds
  #[serde(default)]
  total_duration: Option<u64>,
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
  fn name(&self) -> &str {
    "ollama"
  }

  fn model_id(&self) -> &str {
    &self.model
  }

  #[tracing::instrument(level = "trace", skip(self, request), fields(prompt_len = request.prompt.len()))]
  async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse> {
    let body = GenerateRequest {
      model: &self.model,
      prompt: &request.prompt,
      system: request.system_prompt.as_deref(),
      stream: false,
      options: GenerateOptions {
        temperature: request.temperature.unwrap_or(self.temperature),
      },
    };

    let start = Instant::now();
    let response = self
      .client
      .post(self.generate_url())
      .timeout(self.timeout)
      .json(&body)
      .send()
      .await?;

    trace!(
      status = %response.status(),
      elapsed_ms = start.elapsed().as_millis(),
      "Received generation response"
    );

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();
      warn!(status = %status, model = %self.model, "Ollama generation failed");
      return Err(LlmError::ProviderError(format!("Ollama returned {}: {}", status, text)));
    }

    let result: GenerateResponse = response.json().await?;
    if result.response.trim().is_empty() {
      return Err(LlmError::EmptyResponse);
    }

    let duration_ms = result
      .total_duration
      .map(|ns| ns / 1_000_000)
      .unwrap_or_else(|| start.elapsed().as_millis() as u64);

    debug!(
      model = %self.model,
      input_tokens = result.prompt_eval_count.unwrap_or(0),
      output_tokens = result.eval_count.unwrap_or(0),
      duration_ms,
      "Generated answer"
    );

    Ok(InferenceResponse {
      text: result.response,
      input_tokens: result.prompt_eval_count.unwrap_or(0),
      output_tokens: result.eval_count.unwrap_or(0),
      duration_ms,
    })
  }
}
