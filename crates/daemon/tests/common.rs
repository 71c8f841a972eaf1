//! Common test utilities for daemon integration tests
//!
//! The collaborators are replaced with deterministic fakes so the HTTP
//! surface can be exercised without Ollama or real PDFs.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use daemon::{AppState, Orchestrator, build_router};
use embedding::{EmbeddingError, EmbeddingMode, EmbeddingProvider};
use extract::{DocumentExtractor, ExtractError};
use llm::{GenerationProvider, InferenceRequest, InferenceResponse, LlmError};
use serde_json::Value;
use sourcely_core::{Config, Page};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

pub const BOUNDARY: &str = "sourcely-test-boundary";

/// Treats bytes as `%PDF` followed by UTF-8 pages separated by form feeds
pub struct FormFeedExtractor;

impl DocumentExtractor for FormFeedExtractor {
  fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let body = bytes
      .strip_prefix(b"%PDF\n")
      .ok_or_else(|| ExtractError::InvalidDocument("missing header".to_string()))?;
    let text = std::str::from_utf8(body).map_err(|e| ExtractError::InvalidDocument(e.to_string()))?;

    Ok(
      text
        .split('\x0c')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Page::new(i as u32 + 1, page.trim()))
        .collect(),
    )
  }
}

/// Build a fake PDF the extractor above understands
#[allow(dead_code)]
pub fn fake_pdf(pages: &[&str]) -> Vec<u8> {
  let mut bytes = b"%PDF\n".to_vec();
  bytes.extend(pages.join("\x0c").into_bytes());
  bytes
}

const VOCABULARY: [&str; 4] = ["warranty", "refund", "shipping", "battery"];

/// Embeds text as a bias term plus keyword counts
#[derive(Default)]
pub struct KeywordEmbedder {
  pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
  fn name(&self) -> &str {
    "keyword"
  }

  fn model_id(&self) -> &str {
    "keyword"
  }

  async fn embed_batch(&self, texts: &[&str], _mode: EmbeddingMode) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(
      texts
        .iter()
        .map(|text| {
          let lower = text.to_lowercase();
          let mut vector = vec![1.0];
          vector.extend(VOCABULARY.iter().map(|word| lower.matches(word).count() as f32));
          vector
        })
        .collect(),
    )
  }
}

/// How the fake generator responds
#[allow(dead_code)]
pub enum Reply {
  /// Cite the first context block in the prompt
  CiteFirst,
  /// Return this text verbatim
  Fixed(&'static str),
  /// Fail as if Ollama were down
  Unavailable,
}

pub struct FakeGenerator {
  pub reply: Reply,
  pub calls: AtomicUsize,
}

impl FakeGenerator {
  pub fn new(reply: Reply) -> Self {
    Self {
      reply,
      calls: AtomicUsize::new(0),
    }
  }
}

/// Id of the first `[Chunk N]` label that starts a line
fn first_block_id(prompt: &str) -> Option<usize> {
  prompt.split('\n').find_map(|line| {
    let rest = line.strip_prefix("[Chunk ")?;
    let id = rest.strip_suffix(']')?;
    id.parse().ok()
  })
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
  fn name(&self) -> &str {
    "fake"
  }

  fn model_id(&self) -> &str {
    "fake"
  }

  async fn infer(&self, request: InferenceRequest) -> llm::Result<InferenceResponse> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let text = match &self.reply {
      Reply::CiteFirst => match first_block_id(&request.prompt) {
        Some(id) => format!("According to the document, it is covered [Chunk {id}]."),
        None => llm::NOT_FOUND_ANSWER.to_string(),
      },
      Reply::Fixed(text) => text.to_string(),
      Reply::Unavailable => return Err(LlmError::Unavailable("connection refused".to_string())),
    };
    Ok(InferenceResponse {
      text,
      input_tokens: 0,
      output_tokens: 0,
      duration_ms: 1,
    })
  }
}

pub struct TestApp {
  pub router: Router,
  pub state: AppState,
  pub embedder: Arc<KeywordEmbedder>,
  pub generator: Arc<FakeGenerator>,
}

pub fn test_app(reply: Reply) -> TestApp {
  test_app_with_config(reply, Config::default())
}

pub fn test_app_with_config(reply: Reply, config: Config) -> TestApp {
  let embedder = Arc::new(KeywordEmbedder::default());
  let generator = Arc::new(FakeGenerator::new(reply));
  let orchestrator = Orchestrator::new(Arc::new(FormFeedExtractor), embedder.clone(), generator.clone());
  let state = AppState::new(orchestrator, config);
  let router = build_router(state.clone());

  TestApp {
    router,
    state,
    embedder,
    generator,
  }
}

impl TestApp {
  /// Send a request and decode the JSON body
  pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
    let response = self.router.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .expect("body read failed");
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, body)
  }

  pub async fn create_session(&self) -> String {
    let (status, body) = self
      .send(Request::post("/session").body(Body::empty()).unwrap())
      .await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().expect("session_id").to_string()
  }

  #[allow(dead_code)]
  pub async fn upload(&self, session_id: &str, filename: &str, bytes: &[u8]) -> (StatusCode, Value) {
    self.send(upload_request(Some(session_id), Some((filename, bytes)))).await
  }

  #[allow(dead_code)]
  pub async fn query(&self, session_id: &str, question: &str, k: Option<usize>) -> (StatusCode, Value) {
    self.send(Request::post(query_uri(session_id, question, k)).body(Body::empty()).unwrap()).await
  }

  #[allow(dead_code)]
  pub async fn status(&self, session_id: &str) -> (StatusCode, Value) {
    self
      .send(
        Request::get(format!("/status?session_id={session_id}"))
          .body(Body::empty())
          .unwrap(),
      )
      .await
  }
}

/// Encode the query string for `POST /query`
#[allow(dead_code)]
pub fn query_uri(session_id: &str, question: &str, k: Option<usize>) -> String {
  let question = question.replace('?', "%3F").replace(' ', "+");
  let mut uri = format!("/query?question={question}&session_id={session_id}");
  if let Some(k) = k {
    uri.push_str(&format!("&k={k}"));
  }
  uri
}

/// Multipart upload with optional fields
#[allow(dead_code)]
pub fn upload_request(session_id: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
  let mut body = Vec::new();
  if let Some(session_id) = session_id {
    body.extend(
      format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{session_id}\r\n").into_bytes(),
    );
  }
  if let Some((filename, bytes)) = file {
    body.extend(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
      )
      .into_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend(format!("--{BOUNDARY}--\r\n").into_bytes());

  Request::post("/upload")
    .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
    .body(Body::from(body))
    .unwrap()
}
