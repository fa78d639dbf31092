//! HTTP webhook layer for the IVR call flow.
//!
//! Exposes an axum [`Router`] that answers telephony-provider callbacks with
//! voice markup, backed by any [`SessionStore`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod voice;

pub use config::{Directory, ServerConfig};
pub use error::Error;

use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  response::{IntoResponse, Response},
  routing::any,
};
use ivr_core::store::SessionStore;
use tower_http::trace::TraceLayer;

use handlers::{callback, form::CallbackForm};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SessionStore> {
  pub store:     Arc<S>,
  pub directory: Arc<Directory>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the webhook.
///
/// Every path and method reaches the same callback handler, matching how
/// providers are usually pointed at a bare host.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SessionStore + Clone + 'static,
{
  Router::new()
    .route("/", any(callback_handler::<S>))
    .fallback(callback_handler::<S>)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn callback_handler<S>(
  State(state): State<AppState<S>>,
  form: CallbackForm,
) -> Response
where
  S: SessionStore + Clone + 'static,
{
  callback::handler(&state, form).await.into_response_or_err()
}

// ─── Helper trait ────────────────────────────────────────────────────────────

trait IntoResponseOrErr {
  fn into_response_or_err(self) -> Response;
}

impl IntoResponseOrErr for Result<Response, Error> {
  fn into_response_or_err(self) -> Response {
    match self {
      Ok(r)  => r,
      Err(e) => e.into_response(),
    }
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::future::Future;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use ivr_core::{
    menu::Department,
    session::{Language, RecordUpdate, SessionId, SessionRecord},
  };
  use ivr_store_fs::FsStore;
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  const FORM: &str = "application/x-www-form-urlencoded";

  fn directory() -> Directory {
    [
      ((Department::Support, Language::English), vec!["+2341000".to_string(), "+2341001".to_string()]),
      ((Department::Support, Language::Pidgin), vec!["+2342000".to_string()]),
      ((Department::Sales, Language::English), vec!["+2343000".to_string()]),
      ((Department::Sales, Language::Pidgin), vec!["+2344000".to_string()]),
    ]
    .into_iter()
    .collect()
  }

  async fn make_state() -> (TempDir, AppState<FsStore>) {
    let dir   = TempDir::new().unwrap();
    let store = FsStore::open(dir.path()).await.unwrap();
    let state = AppState {
      store:     Arc::new(store),
      directory: Arc::new(directory()),
    };
    (dir, state)
  }

  fn id(s: &str) -> SessionId { SessionId::new(s).unwrap() }

  async fn post<S>(state: AppState<S>, body: &str) -> (StatusCode, String, String)
  where
    S: SessionStore + Clone + 'static,
  {
    let req = Request::builder()
      .method("POST")
      .uri("/")
      .header(header::CONTENT_TYPE, FORM)
      .body(Body::from(body.to_string()))
      .unwrap();
    send(state, req).await
  }

  async fn send<S>(state: AppState<S>, req: Request<Body>) -> (StatusCode, String, String)
  where
    S: SessionStore + Clone + 'static,
  {
    let resp   = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let ct     = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .map(|v| v.to_str().unwrap().to_string())
      .unwrap_or_default();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, ct, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn select(state: &AppState<FsStore>, session: &str, language: Language) {
    state
      .store
      .merge(&id(session), RecordUpdate::select_language(language))
      .await
      .unwrap();
  }

  // ── Scenarios ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_contact_plays_language_menu() {
    let (_dir, state) = make_state().await;
    let (status, ct, xml) =
      post(state.clone(), "sessionId=s1&isActive=1&dtmfDigits=").await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.contains("xml"), "Content-Type: {ct}");
    assert!(xml.contains(r#"<GetDigits timeout="10">"#), "{xml}");
    assert!(xml.contains("Select your language"), "{xml}");

    let record = state.store.load(&id("s1")).await.unwrap();
    assert_eq!(record, SessionRecord::default());
  }

  #[tokio::test]
  async fn pressing_two_selects_pidgin_before_replying() {
    let (_dir, state) = make_state().await;
    let (status, _, xml) =
      post(state.clone(), "sessionId=s2&isActive=1&dtmfDigits=2").await;

    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("You don select pidgin"), "{xml}");
    assert!(xml.contains("GetDigits"), "{xml}");

    let on_disk = std::fs::read_to_string(state.store.record_path(&id("s2"))).unwrap();
    assert!(on_disk.contains(r#""language": "pidgin""#), "{on_disk}");
    assert!(on_disk.contains(r#""language_selected": true"#), "{on_disk}");
  }

  #[tokio::test]
  async fn english_support_is_forwarded_with_recording() {
    let (_dir, state) = make_state().await;
    select(&state, "s3", Language::English).await;

    let (status, _, xml) =
      post(state, "sessionId=s3&isActive=1&dtmfDigits=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("forwarded to a support agent"), "{xml}");
    assert!(
      xml.contains(r#"<Dial phoneNumbers="+2341000,+2341001" record="true" sequential="false"/>"#),
      "{xml}"
    );
  }

  #[tokio::test]
  async fn pidgin_sales_uses_pidgin_numbers() {
    let (_dir, state) = make_state().await;
    select(&state, "s3b", Language::Pidgin).await;

    let (_, _, xml) = post(state, "sessionId=s3b&isActive=1&dtmfDigits=2").await;
    assert!(xml.contains("our sales people"), "{xml}");
    assert!(xml.contains(r#"phoneNumbers="+2344000""#), "{xml}");
  }

  #[tokio::test]
  async fn unknown_department_digit_leaves_record_alone() {
    let (_dir, state) = make_state().await;
    select(&state, "s4", Language::Pidgin).await;
    let path   = state.store.record_path(&id("s4"));
    let before = std::fs::read(&path).unwrap();

    let (status, _, xml) =
      post(state.clone(), "sessionId=s4&isActive=1&dtmfDigits=9").await;

    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("We no understand the option wey you select."), "{xml}");
    assert!(!xml.contains("GetDigits"), "{xml}");
    assert_eq!(std::fs::read(&path).unwrap(), before);
  }

  #[tokio::test]
  async fn hangup_logs_every_field_and_acknowledges() {
    let (_dir, state) = make_state().await;
    select(&state, "s5", Language::English).await;

    let body = "sessionId=s5&isActive=0&durationInSeconds=42&callerNumber=%2B2348000";
    let (status, ct, text) = post(state.clone(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.starts_with("text/plain"), "Content-Type: {ct}");
    assert_eq!(text, "call logged");

    let record = state.store.load(&id("s5")).await.unwrap();
    assert_eq!(record.selected_language(), Some(Language::English));
    assert_eq!(record.fields["isActive"], "0");
    assert_eq!(record.fields["durationInSeconds"], "42");
    assert_eq!(record.fields["callerNumber"], "+2348000");
    assert_eq!(record.fields["sessionId"], "s5");
  }

  #[tokio::test]
  async fn duplicate_hangup_is_harmless() {
    let (_dir, state) = make_state().await;
    let body = "sessionId=s6&isActive=0&durationInSeconds=7";

    post(state.clone(), body).await;
    let first = state.store.load(&id("s6")).await.unwrap();
    let (status, _, _) = post(state.clone(), body).await;
    let second = state.store.load(&id("s6")).await.unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
  }

  // ── Full call ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn full_call_walks_the_menu() {
    let (_dir, state) = make_state().await;

    let (_, _, xml) = post(state.clone(), "sessionId=c1&isActive=1").await;
    assert!(xml.contains("Select your language"), "{xml}");

    let (_, _, xml) = post(state.clone(), "sessionId=c1&isActive=1&dtmfDigits=7").await;
    assert!(xml.contains("Select your language"), "{xml}");

    let (_, _, xml) = post(state.clone(), "sessionId=c1&isActive=1&dtmfDigits=1").await;
    assert!(xml.contains("You selected english"), "{xml}");

    let (_, _, xml) = post(state.clone(), "sessionId=c1&isActive=1&dtmfDigits=2").await;
    assert!(xml.contains("forwarded to a sales agent"), "{xml}");
    assert!(xml.contains(r#"phoneNumbers="+2343000""#), "{xml}");

    let (_, _, text) = post(state.clone(), "sessionId=c1&isActive=0").await;
    assert_eq!(text, "call logged");
    assert_eq!(state.store.tracked_sessions(), 0);
  }

  #[tokio::test]
  async fn abandoned_calls_are_not_tracked() {
    let (_dir, state) = make_state().await;

    for n in 0..100 {
      let body = format!("sessionId=gone-{n}&isActive=1&dtmfDigits=2");
      let (status, _, _) = post(state.clone(), &body).await;
      assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.store.tracked_sessions(), 0);
  }

  #[tokio::test]
  async fn oversized_callback_is_rejected() {
    let (_dir, state) = make_state().await;
    let body = format!("sessionId=big&note={}", "a".repeat(70 * 1024));
    let (status, _, _) = post(state.clone(), &body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!state.store.record_path(&id("big")).exists());
  }

  #[tokio::test]
  async fn query_string_callbacks_are_accepted() {
    let (_dir, state) = make_state().await;
    let req = Request::builder()
      .method("GET")
      .uri("/?sessionId=q1&isActive=1&dtmfDigits=2")
      .body(Body::empty())
      .unwrap();

    let (status, _, xml) = send(state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("You don select pidgin"), "{xml}");
  }

  // ── Errors ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_session_id_is_bad_request() {
    let (_dir, state) = make_state().await;
    let (status, _, _) = post(state, "isActive=1&dtmfDigits=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn corrupt_record_gets_fallback_and_service_continues() {
    let (_dir, state) = make_state().await;
    std::fs::write(state.store.record_path(&id("bad")), "not json").unwrap();

    let (status, _, xml) = post(state.clone(), "sessionId=bad&dtmfDigits=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("unable to take your call"), "{xml}");

    let (status, _, xml) = post(state, "sessionId=good&dtmfDigits=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("You selected english"), "{xml}");
  }

  #[derive(Clone)]
  struct BrokenStore;

  impl SessionStore for BrokenStore {
    type Error = std::io::Error;

    fn load<'a>(
      &'a self,
      _id: &'a SessionId,
    ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + 'a {
      async { Err(std::io::Error::other("disk gone")) }
    }

    fn merge<'a>(
      &'a self,
      _id: &'a SessionId,
      _update: RecordUpdate,
    ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + 'a {
      async { Err(std::io::Error::other("disk gone")) }
    }
  }

  fn broken_state() -> AppState<BrokenStore> {
    AppState {
      store:     Arc::new(BrokenStore),
      directory: Arc::new(directory()),
    }
  }

  #[tokio::test]
  async fn unreadable_store_speaks_fallback() {
    let (status, ct, xml) = post(broken_state(), "sessionId=x&dtmfDigits=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(ct.contains("xml"), "Content-Type: {ct}");
    assert!(xml.contains("<Say"), "{xml}");
    assert!(xml.contains("Please try again later"), "{xml}");
  }

  #[tokio::test]
  async fn unwritable_store_fails_hangup_for_retry() {
    let (status, _, _) = post(broken_state(), "sessionId=x&isActive=0").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  }
}
