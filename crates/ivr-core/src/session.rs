//! Session records — the per-call state persisted between callbacks.
//!
//! A record is created empty on the first callback of a call, gains a
//! language selection once the caller picks one, and absorbs every form field
//! of the final callback when the call ends.

use std::{collections::BTreeMap, fmt, str::FromStr};

use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Keys of a persisted record that are owned by the call flow and never
/// overwritten by free-form fields.
pub const RESERVED_KEYS: [&str; 2] = ["language_selected", "language"];

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Provider-assigned call identifier. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.is_empty() {
      return Err(Error::EmptySessionId);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Language ────────────────────────────────────────────────────────────────

/// The language a caller chose at the top-level menu.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Language {
  #[default]
  English,
  Pidgin,
}

impl Language {
  /// Parse the stored (lowercase) form of a language.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownLanguage(s.to_string()))
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Everything persisted about a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
  pub language_selected: bool,
  pub language:          Option<Language>,
  /// Free-form fields captured when the call ends.
  pub fields:            BTreeMap<String, String>,
}

impl SessionRecord {
  /// The caller's language if one has been validly selected.
  pub fn selected_language(&self) -> Option<Language> {
    if self.language_selected { self.language } else { None }
  }

  /// Merge `update` into this record in place.
  ///
  /// A language is set at most once per call. Free-form fields overwrite
  /// same-named fields and leave the rest untouched; reserved keys are
  /// skipped.
  pub fn apply(&mut self, update: RecordUpdate) {
    if let Some(language) = update.language {
      match self.selected_language() {
        None => {
          self.language_selected = true;
          self.language = Some(language);
        }
        Some(current) if current != language => {
          warn!(%current, requested = %language, "language already selected; keeping it");
        }
        Some(_) => {}
      }
    }

    for (key, value) in update.fields {
      if RESERVED_KEYS.contains(&key.as_str()) {
        debug!(%key, "dropping reserved key from free-form fields");
        continue;
      }
      self.fields.insert(key, value);
    }
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// A set of changes to merge into a [`SessionRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
  pub language: Option<Language>,
  pub fields:   BTreeMap<String, String>,
}

impl RecordUpdate {
  pub fn select_language(language: Language) -> Self {
    Self { language: Some(language), ..Self::default() }
  }

  pub fn fields(fields: BTreeMap<String, String>) -> Self {
    Self { fields, ..Self::default() }
  }
}
