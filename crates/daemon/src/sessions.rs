//! Per-client session registry.
//!
//! Each session owns one document's chunks and vector index. Sessions are
//! immutable once published: an upload builds a replacement and swaps the
//! `Arc` under the write lock, so a query holding the old `Arc` keeps a
//! consistent view until it finishes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use index::{FlatL2Index, VectorIndex};
use serde::{Deserialize, Serialize};
use sourcely_core::Chunk;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("Session not found: {0}")]
  NotFound(String),
}

/// Opaque session identifier (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for SessionId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

impl FromStr for SessionId {
  type Err = SessionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s.trim())
      .map(Self)
      .map_err(|_| SessionError::NotFound(s.to_string()))
  }
}

/// One client's document state
#[derive(Debug, Clone)]
pub struct Session {
  pub id: SessionId,
  pub chunks: Vec<Chunk>,
  pub index: Option<FlatL2Index>,
  pub filename: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Session {
  fn empty(id: SessionId, created_at: DateTime<Utc>) -> Self {
    Self {
      id,
      chunks: Vec::new(),
      index: None,
      filename: None,
      created_at,
    }
  }

  pub fn has_index(&self) -> bool {
    self.index.is_some()
  }

  /// The index as the narrow search capability
  pub fn vector_index(&self) -> Option<&dyn VectorIndex> {
    self.index.as_ref().map(|index| index as &dyn VectorIndex)
  }
}

/// Registry of live sessions
#[derive(Default)]
pub struct SessionManager {
  sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new empty session
  pub async fn create(&self) -> SessionId {
    let id = SessionId::new();
    let session = Arc::new(Session::empty(id, Utc::now()));
    self.sessions.write().await.insert(id, session);
    debug!(session_id = %id, "Created session");
    id
  }

  pub async fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
    self.sessions.read().await.get(id).cloned()
  }

  /// Replace a session's document, keeping its identity and creation time
  pub async fn assign(
    &self,
    id: &SessionId,
    chunks: Vec<Chunk>,
    index: FlatL2Index,
    filename: impl Into<String>,
  ) -> Result<(), SessionError> {
    let mut sessions = self.sessions.write().await;
    let current = sessions.get(id).ok_or_else(|| SessionError::NotFound(id.to_string()))?;

    let replacement = Session {
      id: *id,
      chunks,
      index: Some(index),
      filename: Some(filename.into()),
      created_at: current.created_at,
    };
    debug!(session_id = %id, chunks = replacement.chunks.len(), "Assigned document to session");
    sessions.insert(*id, Arc::new(replacement));
    Ok(())
  }

  /// Remove a session; returns whether it existed
  pub async fn delete(&self, id: &SessionId) -> bool {
    let removed = self.sessions.write().await.remove(id).is_some();
    if removed {
      debug!(session_id = %id, "Deleted session");
    }
    removed
  }

  /// Evict sessions older than `max_age`; returns how many were removed
  pub async fn cleanup(&self, max_age: Duration) -> usize {
    self.cleanup_at(max_age, Utc::now()).await
  }

  /// `cleanup` against an explicit clock
  pub async fn cleanup_at(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| now.signed_duration_since(session.created_at) <= max_age);
    let removed = before - sessions.len();
    if removed > 0 {
      info!(removed, remaining = sessions.len(), "Evicted expired sessions");
    }
    removed
  }

  pub async fn len(&self) -> usize {
    self.sessions.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.sessions.read().await.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chunk(id: usize) -> Chunk {
    Chunk {
      chunk_id: id,
      text: format!("chunk {id}"),
      page_number: 1,
      start_char: 0,
    }
  }

  fn index_of(n: usize) -> FlatL2Index {
    let mut index = FlatL2Index::new(2);
    index.add((0..n).map(|i| vec![i as f32, 0.0]).collect()).unwrap();
    index
  }

  #[tokio::test]
  async fn test_create_and_get() {
    let manager = SessionManager::new();
    let id = manager.create().await;

    let session = manager.get(&id).await.unwrap();
    assert_eq!(session.id, id);
    assert!(!session.has_index());
    assert!(session.chunks.is_empty());
    assert!(session.filename.is_none());
    assert_eq!(manager.len().await, 1);
  }

  #[tokio::test]
  async fn test_ids_are_unique() {
    let manager = SessionManager::new();
    let a = manager.create().await;
    let b = manager.create().await;
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn test_get_unknown_is_none() {
    let manager = SessionManager::new();
    assert!(manager.get(&SessionId::new()).await.is_none());
  }

  #[tokio::test]
  async fn test_assign_replaces_document() {
    let manager = SessionManager::new();
    let id = manager.create().await;
    let created_at = manager.get(&id).await.unwrap().created_at;

    manager.assign(&id, vec![chunk(0), chunk(1)], index_of(2), "a.pdf").await.unwrap();
    let first = manager.get(&id).await.unwrap();
    assert_eq!(first.chunks.len(), 2);
    assert_eq!(first.filename.as_deref(), Some("a.pdf"));

    manager.assign(&id, vec![chunk(0)], index_of(1), "b.pdf").await.unwrap();
    let second = manager.get(&id).await.unwrap();
    assert_eq!(second.chunks.len(), 1);
    assert_eq!(second.index.as_ref().unwrap().len(), 1);
    assert_eq!(second.filename.as_deref(), Some("b.pdf"));
    assert_eq!(second.created_at, created_at);

    // A reader holding the old snapshot still sees the old document
    assert_eq!(first.chunks.len(), 2);
    assert_eq!(first.index.as_ref().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_assign_unknown_session() {
    let manager = SessionManager::new();
    let err = manager
      .assign(&SessionId::new(), vec![chunk(0)], index_of(1), "a.pdf")
      .await
      .unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
    assert!(manager.is_empty().await);
  }

  #[tokio::test]
  async fn test_sessions_are_isolated() {
    let manager = SessionManager::new();
    let a = manager.create().await;
    let b = manager.create().await;

    manager.assign(&a, vec![chunk(0)], index_of(1), "a.pdf").await.unwrap();
    assert!(manager.get(&a).await.unwrap().has_index());
    assert!(!manager.get(&b).await.unwrap().has_index());
  }

  #[tokio::test]
  async fn test_delete() {
    let manager = SessionManager::new();
    let id = manager.create().await;
    assert!(manager.delete(&id).await);
    assert!(!manager.delete(&id).await);
    assert!(manager.get(&id).await.is_none());
  }

  #[tokio::test]
  async fn test_cleanup_evicts_only_expired() {
    let manager = SessionManager::new();
    let id = manager.create().await;
    let created_at = manager.get(&id).await.unwrap().created_at;
    let max_age = Duration::from_secs(3600);

    // Exactly max_age old is kept
    let removed = manager.cleanup_at(max_age, created_at + chrono::Duration::seconds(3600)).await;
    assert_eq!(removed, 0);
    assert!(manager.get(&id).await.is_some());

    let removed = manager.cleanup_at(max_age, created_at + chrono::Duration::seconds(3601)).await;
    assert_eq!(removed, 1);
    assert!(manager.get(&id).await.is_none());
  }

  #[tokio::test]
  async fn test_evicted_snapshot_stays_usable() {
    let manager = SessionManager::new();
    let id = manager.create().await;
    manager.assign(&id, vec![chunk(0)], index_of(1), "a.pdf").await.unwrap();

    let held = manager.get(&id).await.unwrap();
    let later = held.created_at + chrono::Duration::days(1);
    assert_eq!(manager.cleanup_at(Duration::from_secs(60), later).await, 1);

    assert_eq!(held.chunks.len(), 1);
    assert!(held.has_index());
  }

  #[test]
  fn test_session_id_parse() {
    let id = SessionId::new();
    assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
    assert!(matches!("nope".parse::<SessionId>(), Err(SessionError::NotFound(_))));
  }
}
