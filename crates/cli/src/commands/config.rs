//! Config commands

use anyhow::Result;
use sourcely_core::Config;
use std::path::Path;

/// Print a commented config template
pub fn cmd_config_template() -> Result<()> {
  print!("{}", Config::generate_template());
  Ok(())
}

/// Print where the config file is read from
pub fn cmd_config_path(overridden: Option<&Path>) -> Result<()> {
  let path = overridden.map(Path::to_path_buf).unwrap_or_else(Config::config_path);
  let state = if path.exists() { "exists" } else { "not found, using defaults" };
  println!("{} ({})", path.display(), state);
  Ok(())
}
