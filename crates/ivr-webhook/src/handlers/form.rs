//! Callback form extraction.
//!
//! Fields are read from the query string and, for url-encoded bodies, from
//! the body, so the route works with any method. Body values win over query
//! values, and the first occurrence of a repeated key wins.

use std::collections::BTreeMap;

use axum::{
  extract::{FromRequest, Request},
  http::header,
};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use ivr_core::{menu::CallEvent, session::SessionId};
use url::form_urlencoded;

use crate::error::Error;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MAX_BODY_BYTES: usize = 64 * 1024;

pub const FIELD_SESSION_ID: &str = "sessionId";
pub const FIELD_IS_ACTIVE: &str = "isActive";
pub const FIELD_DTMF_DIGITS: &str = "dtmfDigits";

/// Every field the provider sent with one callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackForm {
  fields: BTreeMap<String, String>,
}

impl CallbackForm {
  pub fn parse(body: &[u8], query: Option<&str>) -> Self {
    let from_query = query
      .map(|q| form_urlencoded::parse(q.as_bytes()))
      .into_iter()
      .flatten();

    let mut fields = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(body).chain(from_query) {
      fields
        .entry(key.into_owned())
        .or_insert_with(|| value.into_owned());
    }
    Self { fields }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.fields.get(key).map(String::as_str)
  }

  pub fn session_id(&self) -> Result<SessionId, Error> {
    Ok(SessionId::new(self.get(FIELD_SESSION_ID).unwrap_or_default())?)
  }

  /// `isActive=0` ends the call; anything else is a keypress (possibly none).
  pub fn into_event(self) -> CallEvent {
    if self.get(FIELD_IS_ACTIVE) == Some("0") {
      return CallEvent::Ended { fields: self.fields };
    }
    let digits = self.get(FIELD_DTMF_DIGITS).unwrap_or_default().to_string();
    CallEvent::Digits(digits)
  }
}

impl<S> FromRequest<S> for CallbackForm
where
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
    let query = req.uri().query().map(str::to_owned);
    let is_form = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

    let body: Bytes = if is_form {
      axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(body_error)?
    } else {
      Bytes::new()
    };

    Ok(Self::parse(&body, query.as_deref()))
  }
}

/// Only an exceeded length limit is a 413; a broken stream is the client's
/// bad request.
fn body_error(err: axum::Error) -> Error {
  let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
  while let Some(e) = source {
    if e.is::<LengthLimitError>() {
      return Error::PayloadTooLarge;
    }
    source = e.source();
  }
  Error::Body(err)
}
