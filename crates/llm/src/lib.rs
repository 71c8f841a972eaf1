pub mod citations;
mod ollama;
pub mod prompts;
mod provider;

pub use citations::{extract_citations, is_ungrounded};
pub use ollama::OllamaGenerator;
pub use prompts::{NOT_FOUND_ANSWER, build_answer_prompt};
pub use provider::{GenerationProvider, Result};

/// Request for answer generation
#[derive(Debug, Clone, Default)]
pub struct InferenceRequest {
  /// The prompt to send
  pub prompt: String,
  /// Optional system prompt
  pub system_prompt: Option<String>,
  /// Sampling temperature; the provider default applies when unset
  pub temperature: Option<f32>,
}

impl InferenceRequest {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      prompt: prompt.into(),
      ..Default::default()
    }
  }
}

/// Response from answer generation
#[derive(Debug, Clone)]
pub struct InferenceResponse {
  /// The generated text
  pub text: String,
  /// Prompt tokens evaluated
  pub input_tokens: u32,
  /// Tokens generated
  pub output_tokens: u32,
  /// Duration in milliseconds
  pub duration_ms: u64,
}

/// Errors that can occur during generation
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
  #[error("Generation service unavailable: {0}")]
  Unavailable(String),
  #[error("Request failed: {0}")]
  Request(reqwest::Error),
  #[error("Generation request timed out")]
  Timeout,
  #[error("Provider error: {0}")]
  ProviderError(String),
  #[error("Generation service returned an empty response")]
  EmptyResponse,
}

impl LlmError {
  /// Whether the service could not be reached at all
  pub fn is_unavailable(&self) -> bool {
    matches!(self, LlmError::Unavailable(_))
  }
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_connect() {
      LlmError::Unavailable(e.to_string())
    } else if e.is_timeout() {
      LlmError::Timeout
    } else {
      LlmError::Request(e)
    }
  }
}
