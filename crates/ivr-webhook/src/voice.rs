//! Voice markup generation.
//!
//! Every reply to the provider is one of a handful of shapes: a prompt that
//! collects digits, a forward to a list of numbers, a bare spoken message,
//! or the plain-text acknowledgment sent when a call ends. Markup is written
//! with `quick-xml`'s writer API so spoken text is always escaped.

use std::io::{self, Cursor};

use axum::{
  body::Body,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use ivr_core::{
  menu::Action,
  prompt::Prompt,
  session::Language,
};
use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{config::Directory, error::Error};

pub const CONTENT_TYPE_MARKUP: &str = "application/xml; charset=utf-8";

/// Seconds the provider waits for a keypress after a prompt.
pub const DIGIT_TIMEOUT_SECS: u32 = 10;

/// Body of the reply to a call-ended callback.
pub const CALL_LOGGED: &str = "call logged";

// ─── Reply ───────────────────────────────────────────────────────────────────

/// A rendered-on-demand reply to one callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
  /// Speak `text`, then wait for digits.
  Collect { text: &'static str },
  /// Speak `text`, then ring every number at once with recording on.
  Forward { text: &'static str, numbers: Vec<String> },
  /// Speak `text` and collect nothing.
  Say { text: &'static str },
  /// Plain-text acknowledgment, not markup.
  Acknowledge,
}

impl Reply {
  /// Map a menu action onto the reply that carries it out.
  pub fn for_action(action: Action, directory: &Directory) -> Self {
    match action {
      Action::LanguageMenu => Self::Collect {
        text: Prompt::LanguageMenu.text(None),
      },
      Action::DepartmentMenu(language) => Self::Collect {
        text: Prompt::DepartmentMenu.text(Some(language)),
      },
      Action::Forward(department, language) => {
        let numbers = directory.numbers(department, language);
        if numbers.is_empty() {
          tracing::warn!(
            %department,
            %language,
            "no destination numbers configured; forwarding to an empty list"
          );
        }
        Self::Forward {
          text:    Prompt::Forwarding(department).text(Some(language)),
          numbers: numbers.to_vec(),
        }
      }
      Action::UnknownOption(language) => Self::Say {
        text: Prompt::UnknownOption.text(Some(language)),
      },
      Action::LogCall => Self::Acknowledge,
    }
  }

  /// The message spoken when session state is unavailable.
  pub fn fallback(language: Option<Language>) -> Self {
    Self::Say { text: Prompt::Fallback.text(language) }
  }

  /// Serialise a markup reply. [`Reply::Acknowledge`] has no markup and
  /// yields its plain-text body.
  pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
    match self {
      Self::Acknowledge => Ok(CALL_LOGGED.as_bytes().to_vec()),
      markup => markup.write_markup().map_err(|e| Error::Xml(e.to_string())),
    }
  }

  fn write_markup(&self) -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Cursor::new(Vec::new()));
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_start(&mut w, "Response")?;

    match self {
      Self::Collect { text } => {
        let timeout = DIGIT_TIMEOUT_SECS.to_string();
        write_start_with_attr(&mut w, "GetDigits", &[("timeout", &timeout)])?;
        write_say(&mut w, text)?;
        write_end(&mut w, "GetDigits")?;
      }
      Self::Forward { text, numbers } => {
        write_say(&mut w, text)?;
        let numbers = numbers.join(",");
        write_empty_with_attr(&mut w, "Dial", &[
          ("phoneNumbers", &numbers),
          ("record", "true"),
          ("sequential", "false"),
        ])?;
      }
      Self::Say { text } => write_say(&mut w, text)?,
      Self::Acknowledge => {}
    }

    write_end(&mut w, "Response")?;
    Ok(w.into_inner().into_inner())
  }
}

impl IntoResponse for Reply {
  fn into_response(self) -> Response {
    let content_type = match self {
      Self::Acknowledge => "text/plain; charset=utf-8",
      _ => CONTENT_TYPE_MARKUP,
    };
    match self.to_bytes() {
      Ok(body) => (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(body),
      )
        .into_response(),
      Err(e) => e.into_response(),
    }
  }
}

// ─── XML writer helpers
// ───────────────────────────────────────────────────────

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_start(w: &mut XmlWriter, tag: &str) -> io::Result<()> {
  w.write_event(Event::Start(BytesStart::new(tag)))
}

fn write_start_with_attr(
  w: &mut XmlWriter,
  tag: &str,
  attrs: &[(&str, &str)],
) -> io::Result<()> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, *v));
  }
  w.write_event(Event::Start(el))
}

fn write_end(w: &mut XmlWriter, tag: &str) -> io::Result<()> {
  w.write_event(Event::End(BytesEnd::new(tag)))
}

fn write_empty_with_attr(
  w: &mut XmlWriter,
  tag: &str,
  attrs: &[(&str, &str)],
) -> io::Result<()> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, *v));
  }
  w.write_event(Event::Empty(el))
}

fn write_say(w: &mut XmlWriter, text: &str) -> io::Result<()> {
  write_start_with_attr(w, "Say", &[("voice", "man"), ("playBeep", "true")])?;
  w.write_event(Event::Text(BytesText::new(text)))?;
  write_end(w, "Say")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
