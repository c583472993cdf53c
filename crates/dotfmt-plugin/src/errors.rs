//! Error types for request handling and the session.
//!
//! [`RequestError`] is recoverable: it becomes an error response for one
//! request id and the session carries on. [`SessionError`] is fatal.

use std::error::Error as StdError;
use std::io;
use std::string::FromUtf8Error;
use std::sync::Arc;

use dotfmt_config::ConfigError;
use dotfmt_protocol::ProtocolError;
use thiserror::Error;

use crate::formatter::FormatError;

/// Failures scoped to a single request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Configuration lookup or decoding failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Formatter selection or formatting failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A text field was not valid UTF-8.
    #[error("{field} was not valid UTF-8")]
    InvalidUtf8 {
        /// Name of the offending field.
        field: &'static str,
        /// Decoder error.
        #[source]
        source: FromUtf8Error,
    },

    /// A response body could not be serialised.
    #[error("failed to serialise response: {source}")]
    Serialise {
        /// Encoder error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The format job thread could not be started.
    #[error("failed to start format job: {source}")]
    SpawnJob {
        /// OS error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The format job observed cancellation before finishing.
    #[error("format request {id} was cancelled")]
    Cancelled {
        /// Id of the cancelled request.
        id: u32,
    },

    /// Host formatting was requested from the plugin.
    #[error("Cannot host format with a plugin.")]
    HostFormatUnsupported,
}

impl RequestError {
    pub(crate) fn serialise(source: serde_json::Error) -> Self {
        Self::Serialise {
            source: Arc::new(source),
        }
    }

    /// Renders the error and its source chain, one cause per line.
    #[must_use]
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            // Transparent and templated variants often repeat their source.
            if !report.ends_with(&cause_text) {
                report.push('\n');
                report.push_str(&cause_text);
            }
            source = cause.source();
        }
        report
    }
}

/// Side of the session a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionSide {
    /// The stdin reading loop.
    Reader,
    /// The stdout writer thread.
    Writer,
}

/// Failures that end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The byte stream is broken or corrupt.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session thread panicked.
    #[error("{side} thread panicked")]
    ThreadPanic {
        /// Which thread.
        side: SessionSide,
    },

    /// The writer stopped while responses were still being queued.
    #[error("response writer stopped")]
    WriterStopped,

    /// A session thread could not be started.
    #[error("failed to start {side} thread: {source}")]
    Spawn {
        /// Which thread.
        side: SessionSide,
        /// OS error.
        #[source]
        source: Arc<io::Error>,
    },
}
