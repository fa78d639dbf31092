//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read request body: {0}")]
  Body(#[source] axum::Error),
  #[error("request body too large")]
  PayloadTooLarge,
  #[error("invalid session: {0}")]
  Session(#[from] ivr_core::Error),
  #[error("xml error: {0}")]
  Xml(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Body(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
      Error::PayloadTooLarge => {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response()
      }
      Error::Session(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
      Error::Xml(msg) => {
        (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
      }
      Error::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
    }
  }
}
