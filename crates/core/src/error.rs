use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Invalid input: {0}")]
  Input(String),

  #[error("Configuration: {0}")]
  Configuration(String),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
