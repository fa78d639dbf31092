//! Error type for `ivr-store-fs`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The file parsed as JSON but is not a record.
  #[error("malformed session record in {0}")]
  Malformed(PathBuf),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
