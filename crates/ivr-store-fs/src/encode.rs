//! Encoding and decoding between [`SessionRecord`] and its on-disk JSON
//! object, plus the mapping from session ids to file names.
//!
//! Decoding is lenient: a language flag that is not JSON `true` or an
//! unrecognised language name simply reads as "no language selected", so a
//! damaged record restarts the menu instead of failing the call.

use std::path::Path;

use ivr_core::session::{Language, SessionId, SessionRecord};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

const KEY_LANGUAGE_SELECTED: &str = "language_selected";
const KEY_LANGUAGE: &str = "language";
const HASHED_PREFIX: &str = "sha256-";

// ─── File names ──────────────────────────────────────────────────────────────

/// The file stem a session is stored under.
///
/// Ids made only of ASCII alphanumerics, `-`, `_` and `.` (not leading) are
/// used verbatim. Anything else is replaced by a SHA-256 digest so that no id
/// can address a path outside the data directory. Ids that already look like
/// a digest key are hashed too, so they cannot alias another session.
pub fn file_key(id: &SessionId) -> String {
  let raw = id.as_str();
  let safe = !raw.starts_with('.')
    && !raw.starts_with(HASHED_PREFIX)
    && raw
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
  if safe {
    raw.to_string()
  } else {
    format!("{HASHED_PREFIX}{}", hex::encode(Sha256::digest(raw.as_bytes())))
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

pub fn encode_record(record: &SessionRecord) -> Result<String> {
  let mut map = Map::new();
  for (key, value) in &record.fields {
    map.insert(key.clone(), Value::String(value.clone()));
  }
  if record.language_selected {
    map.insert(KEY_LANGUAGE_SELECTED.to_string(), Value::Bool(true));
  }
  if let Some(language) = record.language {
    map.insert(KEY_LANGUAGE.to_string(), Value::String(language.as_ref().to_string()));
  }
  Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

pub fn decode_record(bytes: &[u8], path: &Path) -> Result<SessionRecord> {
  let map = match serde_json::from_slice::<Value>(bytes)? {
    Value::Object(map) => map,
    _ => return Err(Error::Malformed(path.to_path_buf())),
  };

  let mut record = SessionRecord::default();
  for (key, value) in map {
    match key.as_str() {
      KEY_LANGUAGE_SELECTED => {
        record.language_selected = value == Value::Bool(true);
      }
      KEY_LANGUAGE => {
        record.language = value.as_str().and_then(|s| Language::parse(s).ok());
      }
      _ => {
        let text = match value {
          Value::String(s) => s,
          other => other.to_string(),
        };
        record.fields.insert(key, text);
      }
    }
  }
  Ok(record)
}
