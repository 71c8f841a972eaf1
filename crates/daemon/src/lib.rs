pub mod lifecycle;
pub mod orchestrator;
pub mod server;
pub mod sessions;

pub use lifecycle::{
  Daemon, LifecycleError, build_orchestrator, create_embedding_provider, create_generation_provider,
};
pub use orchestrator::{AnswerError, IngestError, IngestedDocument, NO_DOCUMENTS_ANSWER, Orchestrator};
pub use server::{ApiError, AppState, build_router, serve};
pub use sessions::{Session, SessionError, SessionId, SessionManager};
