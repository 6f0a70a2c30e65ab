//! Capability settings.
//!
//! [`Settings`] is the write-once configuration value consumed when the
//! capability set is composed. It is usually deserialized from JSON; every
//! field is optional and falls back to its default.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Capabilities enabled when the settings do not name any.
pub const DEFAULT_CAPABILITIES: [&str; 3] = ["redaction", "logging", "localization"];

/// Parameter names filtered from logs by default.
pub const DEFAULT_FILTERED_PARAMS: [&str; 5] = [
    "password",
    "password_confirmation",
    "token",
    "secret",
    "api_key",
];

/// Settings for capability composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Capability identifiers in composition order.
    pub capabilities: Vec<String>,
    /// Parameter names whose values are replaced before logging. Matched
    /// exactly, including case.
    pub filtered_params: Vec<String>,
    /// Unwrap host parameter objects (`{"parameters": {...}}`) before
    /// redaction and logging.
    pub unwrap_host_params: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capabilities: DEFAULT_CAPABILITIES.iter().map(ToString::to_string).collect(),
            filtered_params: DEFAULT_FILTERED_PARAMS
                .iter()
                .map(ToString::to_string)
                .collect(),
            unwrap_host_params: false,
        }
    }
}

impl Settings {
    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] if the text is not valid
    /// settings JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parsing settings from {}", path.display()))
    }
}
