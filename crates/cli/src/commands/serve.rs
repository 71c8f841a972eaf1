//! Serve command

use anyhow::{Context, Result};
use daemon::Daemon;
use sourcely_core::Config;
use tracing::info;

/// Run the HTTP server
pub async fn cmd_serve(mut config: Config, bind: Option<String>, log_file: bool) -> Result<()> {
  if let Some(bind) = bind {
    config.server.bind = bind;
  }
  if log_file {
    eprintln!("Logging to {}", crate::logging::log_file_path().display());
  }

  info!(bind = %config.server.bind, "Starting Sourcely");
  Daemon::new(config).run().await.context("Failed to run server")?;
  Ok(())
}
