//! Sourcely CLI - ask questions about a PDF and get cited answers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sourcely_core::Config;
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{cmd_ask, cmd_config_path, cmd_config_template, cmd_ingest, cmd_serve};
use logging::{init_cli_logging, init_server_logging};

#[derive(Parser)]
#[command(name = "sourcely")]
#[command(about = "Upload a PDF, ask questions, get answers with citations")]
#[command(after_help = "\
QUICK START:
  sourcely serve                  # Start the HTTP API
  sourcely ingest manual.pdf      # Index a PDF locally
  sourcely ask \"question\"         # Ask the indexed PDF

Requires Ollama with the configured embedding and generation models.")]
struct Cli {
  /// Config file (default: user config directory)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the HTTP server
  Serve {
    /// Address to bind (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,
    /// Write logs to a rotating file in the data directory
    #[arg(long)]
    log_file: bool,
  },
  /// Index a PDF into the local store, replacing the previous one
  Ingest {
    /// Path to the PDF
    path: PathBuf,
  },
  /// Ask a question about the last ingested PDF
  Ask {
    question: String,
    /// Number of chunks to retrieve
    #[arg(short, long)]
    k: Option<usize>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Print a config template
  Config {
    /// Print the config file location instead
    #[arg(long)]
    path: bool,
  },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
  match path {
    Some(path) => Config::load_from(path).with_context(|| format!("Failed to load config from {}", path.display())),
    None => Ok(Config::load()),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let config = load_config(cli.config.as_ref())?;

  let _guard = match &cli.command {
    Commands::Serve { log_file, .. } => init_server_logging(&config, *log_file),
    _ => {
      init_cli_logging(&config);
      None
    }
  };

  match cli.command {
    Commands::Serve { bind, log_file } => cmd_serve(config, bind, log_file).await,
    Commands::Ingest { path } => cmd_ingest(&config, &path).await,
    Commands::Ask { question, k, json } => cmd_ask(&config, &question, k, json).await,
    Commands::Config { path } => {
      if path {
        cmd_config_path(cli.config.as_deref())
      } else {
        cmd_config_template()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_definition() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_ask() {
    let cli = Cli::try_parse_from(["sourcely", "ask", "What is covered?", "-k", "3", "--json"]).unwrap();
    match cli.command {
      Commands::Ask { question, k, json } => {
        assert_eq!(question, "What is covered?");
        assert_eq!(k, Some(3));
        assert!(json);
      }
      _ => panic!("expected ask"),
    }
  }

  #[test]
  fn test_parse_serve() {
    let cli = Cli::try_parse_from(["sourcely", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
    assert!(matches!(
      cli.command,
      Commands::Serve { bind: Some(ref b), log_file: false } if b == "0.0.0.0:9000"
    ));
  }
}
