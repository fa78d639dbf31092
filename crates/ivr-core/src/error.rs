//! Error types for `ivr-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("session id must not be empty")]
  EmptySessionId,

  #[error("unknown language: {0:?}")]
  UnknownLanguage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
