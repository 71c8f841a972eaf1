//! Generation provider trait
//!
//! Answer generation is an external service. The pipeline only needs prompt
//! in, text out; implementations decide how to reach a model.

use async_trait::async_trait;

use crate::{InferenceRequest, InferenceResponse, LlmError};

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Trait for answer generation backends
///
/// Failures are returned as-is. Nothing in this crate retries.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
  /// The name of this provider (for logging/identification)
  fn name(&self) -> &str;

  fn model_id(&self) -> &str;

  /// Perform inference with the given request
  async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse>;

  /// Generate text for a bare prompt
  async fn generate(&self, prompt: &str) -> Result<String> {
    Ok(self.infer(InferenceRequest::new(prompt)).await?.text)
  }
}
