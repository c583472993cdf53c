//! Wire-level configuration values as the host sends them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Opaque configuration id chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigHandle(u32);

impl ConfigHandle {
    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration shared across every plugin the host runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Preferred maximum line width. Accepted but not used by layout.
    pub line_width: Option<u32>,
    /// Indent with tabs instead of spaces.
    pub use_tabs: Option<bool>,
    /// Width of one indentation level.
    pub indent_width: Option<u32>,
    /// Newline kind (`lf`, `crlf`, `auto`, `system`). Kept textual so an
    /// unknown value becomes a diagnostic rather than a decode failure.
    pub new_line_kind: Option<String>,
}

impl GlobalConfig {
    /// Decodes the global configuration JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGlobalConfig`] when the payload does not
    /// decode.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(ConfigError::global)
    }
}

/// A single plugin configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Int(i64),
    /// JSON string.
    String(String),
}

impl ConfigValue {
    /// Short type name used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Plugin configuration: property name to value.
///
/// A sorted map keeps resolution and diagnostic order deterministic.
pub type ConfigKeyMap = BTreeMap<String, ConfigValue>;

/// Decodes a plugin configuration or override payload.
///
/// An empty payload is an empty map, which is how the host encodes "no
/// overrides".
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPluginConfig`] when the payload is not an
/// object of booleans, integers and strings.
pub fn parse_key_map(bytes: &[u8]) -> Result<ConfigKeyMap, ConfigError> {
    if bytes.is_empty() {
        return Ok(ConfigKeyMap::new());
    }
    serde_json::from_slice(bytes).map_err(ConfigError::plugin)
}
