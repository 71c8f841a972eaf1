//! Configuration for Sourcely.
//!
//! Loaded from `config.toml` in the user config directory; every field has a
//! default so a missing or partial file is fine.

use crate::{ChunkParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Address to bind (default: 127.0.0.1:8000)
  pub bind: String,

  /// Origins allowed by CORS (default: the Vite dev server)
  pub cors_origins: Vec<String>,

  /// Maximum upload body size in bytes (default: 20MB)
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: "127.0.0.1:8000".to_string(),
      cors_origins: vec!["http://localhost:5173".to_string()],
      max_upload_bytes: 20 * 1024 * 1024,
    }
  }
}

// ============================================================================
// Embedding Configuration
// ============================================================================

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  /// Ollama server URL
  pub ollama_url: String,

  /// Model name (e.g., "nomic-embed-text")
  pub model: String,

  /// Prefix prepended to chunk text when indexing
  pub document_prefix: String,

  /// Prefix prepended to questions when searching
  pub query_prefix: String,

  /// Number of chunk texts sent per embedding request (default: 50)
  pub batch_size: usize,

  /// Per-request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      ollama_url: "http://localhost:11434".to_string(),
      model: "nomic-embed-text".to_string(),
      document_prefix: "search_document: ".to_string(),
      query_prefix: "search_query: ".to_string(),
      batch_size: 50,
      timeout_secs: 60,
    }
  }
}

// ============================================================================
// Generation Configuration
// ============================================================================

/// Answer generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
  /// Ollama server URL
  pub ollama_url: String,

  /// Model name (e.g., "llama3.2")
  pub model: String,

  /// Sampling temperature passed to the model
  pub temperature: f32,

  /// Per-request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      ollama_url: "http://localhost:11434".to_string(),
      model: "llama3.2".to_string(),
      temperature: 0.0,
      timeout_secs: 300,
    }
  }
}

// ============================================================================
// Chunking / Retrieval / Sessions
// ============================================================================

/// Chunking settings (characters)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
  pub chunk_size: usize,
  pub overlap: usize,
}

impl Default for ChunkingConfig {
  fn default() -> Self {
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      overlap: DEFAULT_OVERLAP,
    }
  }
}

impl ChunkingConfig {
  pub fn params(&self) -> Result<ChunkParams> {
    ChunkParams::new(self.chunk_size, self.overlap)
  }
}

/// Retrieval defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
  /// Chunks retrieved per question when the client does not say (default: 5)
  pub default_k: usize,
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    Self { default_k: 5 }
  }
}

/// Session lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// Sessions older than this are evicted on the next cleanup (default: 1 hour)
  pub max_age_secs: u64,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self { max_age_secs: 3600 }
  }
}

impl SessionConfig {
  pub fn max_age(&self) -> Duration {
    Duration::from_secs(self.max_age_secs)
  }
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
  /// Log level: off, error, warn, info, debug, trace
  pub log_level: String,

  /// Log file rotation: daily, hourly, never
  pub log_rotation: String,
}

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      log_level: "info".to_string(),
      log_rotation: "daily".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Sourcely configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub embedding: EmbeddingConfig,
  pub generation: GenerationConfig,
  pub chunking: ChunkingConfig,
  pub retrieval: RetrievalConfig,
  pub sessions: SessionConfig,
  pub daemon: DaemonConfig,
}

impl Config {
  /// Load the user config, falling back to defaults
  pub fn load() -> Self {
    let path = Self::config_path();
    if !path.exists() {
      return Self::default();
    }
    match Self::load_from(&path) {
      Ok(config) => config,
      Err(e) => {
        warn!("Ignoring unreadable config at {:?}: {}", path, e);
        Self::default()
      }
    }
  }

  /// Load and validate a config file
  pub fn load_from(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    let config: Config =
      toml::from_str(&content).map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
  }

  /// Path of the user-level config file
  pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
  }

  /// Check values that would otherwise fail later in the pipeline
  pub fn validate(&self) -> Result<()> {
    self.chunking.params()?;
    if self.embedding.batch_size == 0 {
      return Err(Error::Configuration("embedding.batch_size must be greater than zero".to_string()));
    }
    if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
      return Err(Error::Configuration("timeout_secs must be greater than zero".to_string()));
    }
    if self.retrieval.default_k == 0 {
      return Err(Error::Configuration("retrieval.default_k must be greater than zero".to_string()));
    }
    Ok(())
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    r#"# Sourcely Configuration
# Place in ~/.config/sourcely/config.toml (or $CONFIG_DIR/config.toml)

[server]
bind = "127.0.0.1:8000"
cors_origins = ["http://localhost:5173"]
# Maximum upload size (bytes)
max_upload_bytes = 20971520

[embedding]
ollama_url = "http://localhost:11434"
model = "nomic-embed-text"
# nomic-embed-text expects task prefixes on documents and queries
document_prefix = "search_document: "
query_prefix = "search_query: "
# Chunk texts per embedding request
batch_size = 50
timeout_secs = 60

[generation]
ollama_url = "http://localhost:11434"
model = "llama3.2"
temperature = 0.0
timeout_secs = 300

[chunking]
# Window size and overlap in characters (overlap must be < chunk_size)
chunk_size = 500
overlap = 100

[retrieval]
default_k = 5

[sessions]
# Idle sessions older than this are evicted when a new session is created
max_age_secs = 3600

[daemon]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
log_level = "info"
# daily, hourly, never
log_rotation = "daily"
"#
    .to_string()
  }
}

/// Get the default config directory
///
/// Respects, in order: CONFIG_DIR, XDG_CONFIG_HOME, then the platform default.
pub fn default_config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("CONFIG_DIR") {
    return PathBuf::from(dir);
  }

  if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
    return PathBuf::from(xdg_config).join("sourcely");
  }

  dirs::config_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("sourcely")
}

/// Get the default data directory
///
/// Respects, in order: DATA_DIR, XDG_DATA_HOME, then the platform default.
pub fn default_data_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("DATA_DIR") {
    return PathBuf::from(dir);
  }

  if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
    return PathBuf::from(xdg_data).join("sourcely");
  }

  dirs::data_local_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("sourcely")
}
