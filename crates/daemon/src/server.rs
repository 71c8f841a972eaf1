//! HTTP surface over the session registry and the pipelines.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use index::IndexError;
use serde::{Deserialize, Serialize};
use sourcely_core::{Citation, Config, RetrievalResult};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::orchestrator::{AnswerError, IngestError, Orchestrator};
use crate::sessions::{SessionError, SessionId, SessionManager};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
  pub sessions: Arc<SessionManager>,
  pub orchestrator: Arc<Orchestrator>,
  pub config: Arc<Config>,
}

impl AppState {
  pub fn new(orchestrator: Orchestrator, config: Config) -> Self {
    Self {
      sessions: Arc::new(SessionManager::new()),
      orchestrator: Arc::new(orchestrator),
      config: Arc::new(config),
    }
  }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
  error: String,
}

/// Error response rendered as `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  message: String,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
    }
  }

  fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if self.status.is_server_error() {
      error!(status = %self.status, error = %self.message, "Request failed");
    }
    (self.status, Json(ErrorBody { error: self.message })).into_response()
  }
}

impl From<SessionError> for ApiError {
  fn from(e: SessionError) -> Self {
    Self::new(StatusCode::NOT_FOUND, e.to_string())
  }
}

impl From<IngestError> for ApiError {
  fn from(e: IngestError) -> Self {
    let status = match &e {
      IngestError::Extract(_) | IngestError::NoText => StatusCode::BAD_REQUEST,
      IngestError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      IngestError::Index(_) => StatusCode::BAD_GATEWAY,
      IngestError::Configuration(_) | IngestError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::new(status, e.to_string())
  }
}

impl From<AnswerError> for ApiError {
  fn from(e: AnswerError) -> Self {
    let status = match &e {
      AnswerError::Input(_) => StatusCode::BAD_REQUEST,
      AnswerError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      AnswerError::Embedding(_) | AnswerError::Generation(_) => StatusCode::BAD_GATEWAY,
      AnswerError::Index(IndexError::DimensionMismatch { .. }) => StatusCode::BAD_GATEWAY,
      AnswerError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::new(status, e.to_string())
  }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
  pub status: String,
  pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
  pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
  pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
  pub filename: String,
  pub status: String,
  pub num_chunks: usize,
  pub num_pages_extracted: usize,
  pub preview: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
  pub question: String,
  pub session_id: String,
  pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
  pub question: String,
  pub answer: String,
  pub citations: Vec<Citation>,
  pub retrieved_chunks: Vec<RetrievalResult>,
  /// False when the answer cites nothing that was retrieved
  pub grounded: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
  pub index_loaded: bool,
  pub num_chunks: usize,
  pub filename: Option<String>,
}

// ============================================================================
// Router
// ============================================================================

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|origin| match origin.parse() {
      Ok(value) => Some(value),
      Err(_) => {
        warn!(origin = %origin, "Ignoring invalid CORS origin");
        None
      }
    })
    .collect();
  CorsLayer::new()
    .allow_origin(origins)
    .allow_methods(Any)
    .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
  let cors = cors_layer(&state.config.server.cors_origins);
  let body_limit = state.config.server.max_upload_bytes;

  Router::new()
    .route("/health", get(health))
    .route("/session", post(create_session))
    .route("/session/{session_id}", delete(delete_session))
    .route("/upload", post(upload))
    .route("/query", post(query))
    .route("/status", get(status))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

/// Serve until ctrl-c
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!(addr = %listener.local_addr()?, "Sourcely listening");

  axum::serve(listener, build_router(state))
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
      }
      info!("Received ctrl-c, shutting down...");
    })
    .await
}

// ============================================================================
// Handlers
// ============================================================================

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
  Ok(raw.parse::<SessionId>()?)
}

async fn health() -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ok".to_string(),
    message: "Sourcely is running".to_string(),
  })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
  state.sessions.cleanup(state.config.sessions.max_age()).await;
  let id = state.sessions.create().await;
  info!(session_id = %id, "Session created");
  Json(SessionResponse {
    session_id: id.to_string(),
  })
}

async fn delete_session(State(state): State<AppState>, Path(session_id): Path<String>) -> Json<DeleteResponse> {
  let deleted = match session_id.parse::<SessionId>() {
    Ok(id) => state.sessions.delete(&id).await,
    Err(_) => false,
  };
  Json(DeleteResponse { deleted })
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
  let mut file: Option<(String, Vec<u8>)> = None;
  let mut session_id: Option<String> = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::new(e.status(), e.body_text()))?
  {
    let name = field.name().map(str::to_string);
    match name.as_deref() {
      Some("file") => {
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        file = Some((filename, data.to_vec()));
      }
      Some("session_id") => {
        session_id = Some(field.text().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?);
      }
      _ => {}
    }
  }

  let (filename, bytes) = file.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
  let session_id = session_id.ok_or_else(|| ApiError::bad_request("Missing 'session_id' field"))?;

  if !filename.to_ascii_lowercase().ends_with(".pdf") {
    return Err(ApiError::bad_request("Only PDF files are allowed"));
  }

  let id = parse_session_id(&session_id)?;
  if state.sessions.get(&id).await.is_none() {
    return Err(SessionError::NotFound(session_id).into());
  }

  info!(session_id = %id, filename = %filename, bytes = bytes.len(), "Upload received");
  let document = state.orchestrator.ingest(bytes).await?;
  let num_chunks = document.chunks.len();
  state
    .sessions
    .assign(&id, document.chunks, document.index, filename.clone())
    .await?;

  Ok(Json(UploadResponse {
    filename,
    status: "uploaded".to_string(),
    num_chunks,
    num_pages_extracted: document.num_pages,
    preview: document.preview,
  }))
}

async fn query(
  State(state): State<AppState>,
  params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
  let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let id = parse_session_id(&params.session_id)?;
  let session = state
    .sessions
    .get(&id)
    .await
    .ok_or_else(|| SessionError::NotFound(params.session_id.clone()))?;

  let k = params.k.unwrap_or(state.config.retrieval.default_k);
  let answer = state.orchestrator.answer_session(&params.question, &session, k).await?;

  Ok(Json(QueryResponse {
    question: params.question,
    answer: answer.answer,
    citations: answer.citations,
    retrieved_chunks: answer.retrieved_chunks,
    grounded: answer.grounded,
  }))
}

async fn status(
  State(state): State<AppState>,
  params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
  let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let id = parse_session_id(&params.session_id)?;
  let session = state
    .sessions
    .get(&id)
    .await
    .ok_or_else(|| SessionError::NotFound(params.session_id.clone()))?;

  Ok(Json(StatusResponse {
    index_loaded: session.has_index(),
    num_chunks: session.chunks.len(),
    filename: session.filename.clone(),
  }))
}
