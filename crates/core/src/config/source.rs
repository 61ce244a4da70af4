//! Nested key lookup over the station configuration file.
//!
//! weewx keeps everything under `[Section]` headers; this crate reads the
//! same layout from TOML. Values are accepted either typed
//! (`time_wait = 3600`) or as text (`time_wait = "3600"`), because configs
//! migrated from weewx.conf carry every value as a string.

use std::path::Path;

use crate::error::CoreError;

/// A configuration backend that can answer `section.key` lookups.
pub trait ConfigSource {
    /// Whether the named top-level section exists.
    fn has_section(&self, section: &str) -> bool;

    /// Look up `key` inside `section`.
    fn lookup(&self, section: &str, key: &str) -> Option<ConfigValue>;
}

/// A single configuration value, normalized from whatever the backend holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Render scalar values as text. Lists are not text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::List(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Flatten into a list of strings.
    ///
    /// A text value is split on commas, the way weewx's `option_as_list`
    /// treats `mailto = a@x.com, b@y.com`. Empty entries are dropped.
    pub fn as_list(&self) -> Vec<String> {
        let items: Vec<String> = match self {
            Self::List(values) => values.iter().filter_map(Self::as_text).collect(),
            Self::Text(s) => s.split(',').map(str::to_string).collect(),
            other => other.as_text().into_iter().collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl From<&toml::Value> for ConfigValue {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::Text(s.clone()),
            toml::Value::Integer(i) => Self::Integer(*i),
            toml::Value::Float(f) => Self::Float(*f),
            toml::Value::Boolean(b) => Self::Bool(*b),
            toml::Value::Datetime(d) => Self::Text(d.to_string()),
            toml::Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            toml::Value::Table(_) => Self::List(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// TOML backend
// ---------------------------------------------------------------------------

/// Configuration loaded from a TOML document.
#[derive(Debug, Clone, Default)]
pub struct TomlConfig {
    root: toml::Table,
}

impl TomlConfig {
    /// Parse configuration text.
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let root: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| CoreError::Parse(e.to_string()))?;
        Ok(Self { root })
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }
}

impl ConfigSource for TomlConfig {
    fn has_section(&self, section: &str) -> bool {
        self.root.get(section).is_some_and(toml::Value::is_table)
    }

    fn lookup(&self, section: &str, key: &str) -> Option<ConfigValue> {
        self.root
            .get(section)?
            .as_table()?
            .get(key)
            .map(ConfigValue::from)
    }
}
