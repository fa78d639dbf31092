//! The provider callback — one request per caller interaction.
//!
//! Load the session, derive its menu state, decide, persist any change, then
//! reply. Storage failures never escape: on the menu path the caller hears a
//! fallback message, on the hangup path the provider gets a 500 it can retry.

use axum::response::{IntoResponse, Response};
use ivr_core::{
  menu::{self, Action, CallEvent, MenuState},
  session::SessionId,
  store::SessionStore,
};
use tracing::{debug, error, info};

use crate::{AppState, error::Error, handlers::form::CallbackForm, voice::Reply};

pub async fn handler<S>(
  state: &AppState<S>,
  form: CallbackForm,
) -> Result<Response, Error>
where
  S: SessionStore + 'static,
{
  let session_id = form.session_id()?;
  match form.into_event() {
    event @ CallEvent::Ended { .. } => end_call(state, &session_id, event).await,
    event @ CallEvent::Digits(_) => Ok(menu_step(state, &session_id, event).await),
  }
}

async fn end_call<S>(
  state: &AppState<S>,
  session_id: &SessionId,
  event: CallEvent,
) -> Result<Response, Error>
where
  S: SessionStore + 'static,
{
  // The stored state does not influence hangup handling.
  let decision = menu::decide(MenuState::Start, event);
  if let Some(update) = decision.update {
    let field_count = update.fields.len();
    state
      .store
      .merge(session_id, update)
      .await
      .map_err(|e| {
        error!(%session_id, error = %e, "failed to log ended call");
        Error::store(e)
      })?;
    info!(%session_id, field_count, "call ended");
  }

  Ok(Reply::for_action(decision.action, &state.directory).into_response())
}

async fn menu_step<S>(
  state: &AppState<S>,
  session_id: &SessionId,
  event: CallEvent,
) -> Response
where
  S: SessionStore + 'static,
{
  if let CallEvent::Digits(digits) = &event {
    debug!(%session_id, %digits, "callback");
  }

  let record = match state.store.load(session_id).await {
    Ok(record) => record,
    Err(e) => {
      error!(%session_id, error = %e, "failed to load session record");
      return Reply::fallback(None).into_response();
    }
  };

  let current = MenuState::from_record(&record);
  let decision = menu::decide(current, event);

  let action = match decision.update {
    None => decision.action,
    Some(update) => match state.store.merge(session_id, update).await {
      // A racing callback may have chosen first; answer in the stored language.
      Ok(merged) => match (decision.action, merged.selected_language()) {
        (Action::DepartmentMenu(_), Some(stored)) => Action::DepartmentMenu(stored),
        (action, _) => action,
      },
      Err(e) => {
        error!(%session_id, error = %e, "failed to persist session record");
        return Reply::fallback(current.language()).into_response();
      }
    },
  };

  debug!(%session_id, ?current, ?action, "menu decision");
  Reply::for_action(action, &state.directory).into_response()
}
