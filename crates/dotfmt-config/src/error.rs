//! Errors raised by configuration decoding and the store.

use std::sync::Arc;

use thiserror::Error;

use crate::value::ConfigHandle;

/// Failures that abort a configuration request.
///
/// Problems with individual properties are not errors; they surface as
/// diagnostics on the resolved context instead.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No configuration is registered under the handle.
    #[error("Could not find configuration id: {handle}")]
    HandleNotFound {
        /// The handle that was looked up.
        handle: ConfigHandle,
    },

    /// The global configuration payload was not valid JSON of the right shape.
    #[error("invalid global configuration: {source}")]
    InvalidGlobalConfig {
        /// Decoder error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A plugin configuration or override payload was not a JSON object of
    /// booleans, integers and strings.
    #[error("invalid plugin configuration: {source}")]
    InvalidPluginConfig {
        /// Decoder error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl ConfigError {
    pub(crate) fn global(source: serde_json::Error) -> Self {
        Self::InvalidGlobalConfig {
            source: Arc::new(source),
        }
    }

    pub(crate) fn plugin(source: serde_json::Error) -> Self {
        Self::InvalidPluginConfig {
            source: Arc::new(source),
        }
    }
}
