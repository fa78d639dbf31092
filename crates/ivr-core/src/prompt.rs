//! Spoken message text, looked up by menu step and language.

use crate::{menu::Department, session::Language};

/// A message the caller can hear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
  LanguageMenu,
  DepartmentMenu,
  /// Forwarding notice, including the recording disclosure.
  Forwarding(Department),
  UnknownOption,
  /// Spoken when the call state could not be read or written.
  Fallback,
}

impl Prompt {
  /// The text for this prompt. Without a language, English is used.
  pub fn text(self, language: Option<Language>) -> &'static str {
    match (self, language.unwrap_or_default()) {
      (Self::LanguageMenu, _) => {
        "Welcome. Select your language. Press 1 for english, 2 for pidgin."
      }
      (Self::DepartmentMenu, Language::English) => {
        "You selected english, press 1 to speak to support, press 2 to speak to sales."
      }
      (Self::DepartmentMenu, Language::Pidgin) => {
        "You don select pidgin, press 1 to follow support talk, press 2 for sales."
      }
      (Self::Forwarding(Department::Support), Language::English) => {
        "Your call is being forwarded to a support agent. Note that this call may be recorded."
      }
      (Self::Forwarding(Department::Support), Language::Pidgin) => {
        "We dey connect you to one of our support people. Know say we dey record this call."
      }
      (Self::Forwarding(Department::Sales), Language::English) => {
        "Your call is being forwarded to a sales agent. Note that this call may be recorded."
      }
      (Self::Forwarding(Department::Sales), Language::Pidgin) => {
        "We dey connect you to one of our sales people. Know say we dey record this call."
      }
      (Self::UnknownOption, Language::English) => "You have selected an unknown option",
      (Self::UnknownOption, Language::Pidgin) => "We no understand the option wey you select.",
      (Self::Fallback, Language::English) => {
        "We are unable to take your call right now. Please try again later."
      }
      (Self::Fallback, Language::Pidgin) => {
        "We no fit attend to your call now. Abeg try again later."
      }
    }
  }
}
