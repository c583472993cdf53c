//! Fatal protocol faults.
//!
//! Every variant means the byte stream can no longer be trusted. Callers are
//! expected to end the session rather than attempt resynchronisation. I/O
//! errors are wrapped in `Arc` to satisfy the `result_large_err` Clippy lint.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while reading or writing protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer closed the stream before a complete field arrived.
    #[error("stream closed while waiting for {expected} bytes")]
    StreamClosed {
        /// Number of bytes the reader was waiting for.
        expected: usize,
    },

    /// Reading from the stream failed.
    #[error("failed to read from stream: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Writing to the stream failed.
    #[error("failed to write to stream: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The success marker after a message did not match `0xFFFFFFFF`.
    #[error("catastrophic error: did not find success bytes, found {found:?}")]
    CorruptFrame {
        /// The four bytes read where the marker was expected.
        found: [u8; 4],
    },

    /// The message kind is outside the known kind range.
    #[error("unknown message kind: {kind}")]
    UnknownKind {
        /// Raw kind value read from the stream.
        kind: u32,
    },

    /// A format response carried a change flag other than 0 or 1.
    #[error("unknown format response flag: {flag}")]
    UnknownFormatResponseFlag {
        /// Raw flag value read from the stream.
        flag: u32,
    },

    /// The first value on the stream was not the schema handshake request.
    #[error("expected schema handshake request 0, found {found}")]
    UnexpectedHandshake {
        /// Value read in place of the handshake request.
        found: u32,
    },

    /// The peer rejected or mangled the handshake response.
    #[error("handshake response did not start with success, found {found}")]
    HandshakeRejected {
        /// Value read in place of the success code.
        found: u32,
    },

    /// A variable-width field declared a length above the configured ceiling.
    #[error("variable-width payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Declared or actual payload length.
        len: usize,
        /// Configured ceiling.
        max: usize,
    },
}

impl ProtocolError {
    pub(crate) fn read(source: io::Error) -> Self {
        Self::Read {
            source: Arc::new(source),
        }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Write {
            source: Arc::new(source),
        }
    }
}
