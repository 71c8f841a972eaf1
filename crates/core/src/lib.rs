pub mod chunker;
pub mod config;
pub mod document;
pub mod error;

pub use chunker::{ChunkParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, chunk_pages};
pub use config::{
  ChunkingConfig, Config, DaemonConfig, EmbeddingConfig, GenerationConfig, RetrievalConfig, ServerConfig,
  SessionConfig, default_config_dir, default_data_dir,
};
pub use document::{Answer, Chunk, Citation, EXCERPT_CHARS, Page, RetrievalResult};
pub use error::{Error, Result};
