//! CLI command implementations

mod ask;
mod config;
mod ingest;
mod serve;

pub use ask::cmd_ask;
pub use config::{cmd_config_path, cmd_config_template};
pub use ingest::cmd_ingest;
pub use serve::cmd_serve;
