//! Session configuration
//!
//! Built in code or loaded from YAML:
//!
//! ```yaml
//! flush_mode: manual
//! locales: [fi, en]
//! include_inferred: true
//! ```

use super::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// When pending changes reach the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// After every save and delete
    #[default]
    Always,
    /// When the session transaction commits
    Commit,
    /// Only on explicit `flush`
    Manual,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub flush_mode: FlushMode,
    /// Preferred locales, most preferred first. The first one is the current
    /// locale used when writing localized text.
    pub locales: Vec<String>,
    /// Ask the connection for inferred statements when reading projections
    pub include_inferred: bool,
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> SessionResult<Self> {
        let config: SessionConfig =
            serde_yaml::from_str(yaml).map_err(|e| SessionError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self.normalized()
    }

    pub fn with_flush_mode(mut self, flush_mode: FlushMode) -> Self {
        self.flush_mode = flush_mode;
        self
    }

    /// Locale for writing localized text; empty for the root locale
    pub fn current_locale(&self) -> &str {
        self.locales.first().map(|l| l.as_str()).unwrap_or("")
    }

    /// Language tags compare case-insensitively and are stored lowercase
    fn normalized(mut self) -> Self {
        for locale in &mut self.locales {
            *locale = locale.replace('_', "-").to_ascii_lowercase();
        }
        self
    }
}
