//! Server configuration and the forwarding directory.
//!
//! Settings come from an optional TOML file overlaid by plain environment
//! variables (`PORT`, `DATA_DIR`, `SUPPORT_PHONES_ENG`, ...). Destination
//! numbers are comma-separated lists.

use std::{collections::HashMap, path::{Path, PathBuf}};

use config::{Config, ConfigError, Environment, File};
use ivr_core::{menu::Department, session::Language};
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub data_dir:           PathBuf,
  #[serde(default)]
  pub support_phones_eng: Option<String>,
  #[serde(default)]
  pub support_phones_png: Option<String>,
  #[serde(default)]
  pub sales_phones_eng:   Option<String>,
  #[serde(default)]
  pub sales_phones_png:   Option<String>,
}

impl ServerConfig {
  /// Read `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> Result<Self, ConfigError> {
    Self::build(file, Environment::default())
  }

  fn build(file: &Path, env: Environment) -> Result<Self, ConfigError> {
    Config::builder()
      .set_default("host", DEFAULT_HOST)?
      .set_default("port", i64::from(DEFAULT_PORT))?
      .set_default("data_dir", DEFAULT_DATA_DIR)?
      .add_source(File::from(file).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn directory(&self) -> Directory {
    [
      (Department::Support, Language::English, &self.support_phones_eng),
      (Department::Support, Language::Pidgin, &self.support_phones_png),
      (Department::Sales, Language::English, &self.sales_phones_eng),
      (Department::Sales, Language::Pidgin, &self.sales_phones_png),
    ]
    .into_iter()
    .map(|(department, language, raw)| {
      ((department, language), parse_numbers(raw.as_deref()))
    })
    .collect()
  }
}

/// Split a comma-separated number list, dropping blanks.
fn parse_numbers(raw: Option<&str>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_string)
    .collect()
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Destination numbers keyed by department and language.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  entries: HashMap<(Department, Language), Vec<String>>,
}

impl Directory {
  pub fn numbers(&self, department: Department, language: Language) -> &[String] {
    self
      .entries
      .get(&(department, language))
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  /// Entries with no destination numbers, in a stable order.
  pub fn missing(&self) -> Vec<(Department, Language)> {
    [
      (Department::Support, Language::English),
      (Department::Support, Language::Pidgin),
      (Department::Sales, Language::English),
      (Department::Sales, Language::Pidgin),
    ]
    .into_iter()
    .filter(|(d, l)| self.numbers(*d, *l).is_empty())
    .collect()
  }
}

impl FromIterator<((Department, Language), Vec<String>)> for Directory {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = ((Department, Language), Vec<String>)>,
  {
    Self { entries: iter.into_iter().collect() }
  }
}
