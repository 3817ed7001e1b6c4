//! Lock configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LockError, Result};

/// Which registry entries the release callback sees at teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseScope {
    /// Every entry present during the sweep, including other scenarios' holds
    #[default]
    All,
    /// Only the entries released by the finishing scenario
    Owned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default)]
    pub release_scope: ReleaseScope,

    /// Record a [`LockEvent`](crate::LockEvent) journal
    #[serde(default)]
    pub record_events: bool,

    /// Joins release callback messages in the teardown error
    #[serde(default = "default_separator")]
    pub error_separator: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            release_scope: ReleaseScope::default(),
            record_events: false,
            error_separator: default_separator(),
        }
    }
}

impl LockConfig {
    /// Parse configuration from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| LockError::Config(format!("Invalid config file: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|_| {
            LockError::Config(format!("Could not read config file: {}", path.display()))
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LockError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn release_scope(mut self, scope: ReleaseScope) -> Self {
        self.release_scope = scope;
        self
    }

    pub fn record_events(mut self, enabled: bool) -> Self {
        self.record_events = enabled;
        self
    }

    pub fn error_separator(mut self, separator: impl Into<String>) -> Self {
        self.error_separator = separator.into();
        self
    }
}

fn default_separator() -> String {
    ", ".to_string()
}
