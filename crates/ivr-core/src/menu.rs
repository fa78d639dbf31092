//! The menu state machine.
//!
//! Every callback is resolved by [`decide`], a pure function of the caller's
//! current [`MenuState`] and the incoming [`CallEvent`]. It yields the action
//! to render and, when the call state changes, the [`RecordUpdate`] that must
//! be persisted before the response goes out.
//!
//! ```text
//!   Start ──"1"/"2"──▶ LanguageChosen(lang) ──"1"──▶ forward to support
//!     │ ▲                       │          ──"2"──▶ forward to sales
//!     └─┘ other                 └─ other ─────────▶ unknown option
//!
//!   any state ──call ended──▶ Terminated (fields logged)
//! ```

use std::collections::BTreeMap;

use strum::{AsRefStr, Display};

use crate::session::{Language, RecordUpdate, SessionRecord};

/// Where the caller is in the menu, derived once per callback from the
/// stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
  /// No language chosen yet.
  Start,
  /// Language chosen, awaiting a department.
  LanguageChosen(Language),
}

impl MenuState {
  /// A record flagged as selected but lacking a valid language falls back
  /// to [`MenuState::Start`].
  pub fn from_record(record: &SessionRecord) -> Self {
    match record.selected_language() {
      Some(language) => Self::LanguageChosen(language),
      None => Self::Start,
    }
  }

  pub fn language(&self) -> Option<Language> {
    match self {
      Self::Start => None,
      Self::LanguageChosen(language) => Some(*language),
    }
  }
}

/// The destination category a caller can be forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Department {
  Support,
  Sales,
}

/// What the provider told us about the call in this callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
  /// The caller pressed `digits` (empty on first contact).
  Digits(String),
  /// The call is over; `fields` holds every field of the callback.
  Ended { fields: BTreeMap<String, String> },
}

/// What to send back to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  LanguageMenu,
  DepartmentMenu(Language),
  Forward(Department, Language),
  UnknownOption(Language),
  LogCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
  pub action: Action,
  /// Present when the record must change before responding.
  pub update: Option<RecordUpdate>,
}

impl Decision {
  fn respond(action: Action) -> Self { Self { action, update: None } }
}

/// Resolve one callback.
///
/// The call-ended signal wins over digit handling in every state. Unknown
/// digits at the top level replay the language menu; at the department menu
/// they produce the unknown-option message.
pub fn decide(state: MenuState, event: CallEvent) -> Decision {
  let digits = match event {
    CallEvent::Ended { fields } => {
      return Decision {
        action: Action::LogCall,
        update: Some(RecordUpdate::fields(fields)),
      };
    }
    CallEvent::Digits(digits) => digits,
  };

  match state {
    MenuState::Start => match digits.as_str() {
      "1" => select(Language::English),
      "2" => select(Language::Pidgin),
      _ => Decision::respond(Action::LanguageMenu),
    },
    MenuState::LanguageChosen(language) => match digits.as_str() {
      "1" => Decision::respond(Action::Forward(Department::Support, language)),
      "2" => Decision::respond(Action::Forward(Department::Sales, language)),
      _ => Decision::respond(Action::UnknownOption(language)),
    },
  }
}

fn select(language: Language) -> Decision {
  Decision {
    action: Action::DepartmentMenu(language),
    update: Some(RecordUpdate::select_language(language)),
  }
}
