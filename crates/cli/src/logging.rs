//! Logging setup for CLI commands and the server

use sourcely_core::{Config, default_data_dir};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const LOG_FILE_NAME: &str = "sourcely.log";

/// Get the log file path
pub fn log_file_path() -> PathBuf {
  default_data_dir().join(LOG_FILE_NAME)
}

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  match level.to_lowercase().as_str() {
    "off" => LevelFilter::OFF,
    "error" => LevelFilter::ERROR,
    "warn" => LevelFilter::WARN,
    "info" => LevelFilter::INFO,
    "debug" => LevelFilter::DEBUG,
    "trace" => LevelFilter::TRACE,
    _ => LevelFilter::INFO,
  }
}

fn env_filter(config: &Config) -> EnvFilter {
  let level = parse_log_level(&config.daemon.log_level);
  // RUST_LOG overrides the configured level
  EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

/// Initialize logging for one-shot commands (console, stderr)
pub fn init_cli_logging(config: &Config) {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter(config))
    .with_writer(std::io::stderr)
    .init();
}

/// Initialize logging for the server.
///
/// Logs to the console with colors, or to a rolling file under the data
/// directory when `to_file` is set.
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_server_logging(config: &Config, to_file: bool) -> Option<WorkerGuard> {
  let env_filter = env_filter(config);

  if !to_file {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_ansi(true)
      .init();
    return None;
  }

  let log_dir = default_data_dir();
  if std::fs::create_dir_all(&log_dir).is_err() {
    // Fall back to console-only logging
    init_cli_logging(config);
    return None;
  }

  let file_appender = match config.daemon.log_rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(&log_dir, LOG_FILE_NAME),
    "never" => tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME),
    _ => tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME),
  };
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}
