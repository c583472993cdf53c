//! Frame read/write primitives over a duplex byte stream.
//!
//! All integers are four-byte big-endian values. Reads block until the exact
//! number of bytes arrives; a stream that closes early is reported as
//! [`ProtocolError::StreamClosed`] and is never recovered from.
//!
//! Variable-width payloads support two transfer modes, fixed per schema
//! generation by [`TransferMode::for_schema`]:
//!
//! - **Eager**: the length and the full payload are written back to back.
//! - **Chunked**: the payload is split into fixed-size chunks. After the
//!   first chunk the sender blocks until the receiver writes a four-byte
//!   "ready" signal, which the receiver emits each time it is about to
//!   consume another chunk. This caps the unread bytes in flight regardless
//!   of OS pipe buffer sizes.

use std::io::{self, Read, Write};

use crate::error::ProtocolError;

/// Sentinel written after every complete message.
pub const SUCCESS_MARKER: [u8; 4] = [0xFF; 4];

/// Chunk size used by the stop-and-wait transfer mode.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default ceiling for a single variable-width payload (1 GiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024 * 1024;

/// First schema version that transfers payloads eagerly.
pub const EAGER_TRANSFER_SCHEMA: u32 = 4;

/// Value written as the chunked-transfer "ready" signal.
const READY_SIGNAL: u32 = 0;

/// Payload transfer strategy for variable-width fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Write and read the full payload in one go.
    Eager,
    /// Stop-and-wait transfer in chunks of `chunk_size` bytes.
    Chunked {
        /// Size of each chunk in bytes. Zero is treated as one.
        chunk_size: usize,
    },
}

impl TransferMode {
    /// Returns the transfer mode a schema generation uses.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotfmt_protocol::TransferMode;
    ///
    /// assert_eq!(TransferMode::for_schema(4), TransferMode::Eager);
    /// assert_eq!(
    ///     TransferMode::for_schema(3),
    ///     TransferMode::Chunked { chunk_size: 1024 }
    /// );
    /// ```
    #[must_use]
    pub const fn for_schema(schema_version: u32) -> Self {
        if schema_version >= EAGER_TRANSFER_SCHEMA {
            Self::Eager
        } else {
            Self::Chunked {
                chunk_size: DEFAULT_CHUNK_SIZE,
            }
        }
    }
}

/// Reads protocol fields from a byte stream.
pub struct FrameReader<R> {
    inner: R,
    ready: Option<Box<dyn Write + Send>>,
    chunk_size: usize,
    max_payload: usize,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader using eager transfer.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            ready: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Creates a reader using chunked transfer.
    ///
    /// `ready` is the peer-facing half of the stream; one ready signal is
    /// written to it before each chunk after the first.
    #[must_use]
    pub fn chunked(inner: R, chunk_size: usize, ready: impl Write + Send + 'static) -> Self {
        Self {
            inner,
            ready: Some(Box::new(ready)),
            chunk_size: chunk_size.max(1),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Overrides the ceiling for a single variable-width payload.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Returns the transfer mode this reader uses.
    #[must_use]
    pub const fn mode(&self) -> TransferMode {
        match self.ready {
            Some(_) => TransferMode::Chunked {
                chunk_size: self.chunk_size,
            },
            None => TransferMode::Eager,
        }
    }

    /// Reads one big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::StreamClosed`] on a short read, or
    /// [`ProtocolError::Read`] if the stream fails.
    #[expect(clippy::big_endian_bytes, reason = "the wire format is big-endian")]
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let mut buffer = [0_u8; 4];
        read_exact(&mut self.inner, &mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }

    /// Reads a length-prefixed variable-width field.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the declared length is
    /// above the ceiling, or any error from the underlying reads and ready
    /// signals.
    pub fn read_variable(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let declared = self.read_u32()?;
        let len = usize::try_from(declared).map_err(|_| ProtocolError::PayloadTooLarge {
            len: usize::MAX,
            max: self.max_payload,
        })?;
        if len > self.max_payload {
            return Err(ProtocolError::PayloadTooLarge {
                len,
                max: self.max_payload,
            });
        }

        let mut payload = vec![0_u8; len];
        let Self {
            inner,
            ready,
            chunk_size,
            ..
        } = self;
        match ready {
            None => read_exact(inner, &mut payload)?,
            Some(sink) => {
                for (index, chunk) in payload.chunks_mut(*chunk_size).enumerate() {
                    if index > 0 {
                        signal_ready(sink.as_mut())?;
                    }
                    read_exact(inner, chunk)?;
                }
            }
        }
        Ok(payload)
    }

    /// Reads and validates the trailing success marker.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CorruptFrame`] when the bytes differ from
    /// [`SUCCESS_MARKER`].
    pub fn read_success_marker(&mut self) -> Result<(), ProtocolError> {
        let mut found = [0_u8; 4];
        read_exact(&mut self.inner, &mut found)?;
        if found == SUCCESS_MARKER {
            Ok(())
        } else {
            Err(ProtocolError::CorruptFrame { found })
        }
    }

    /// Consumes the reader and returns the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes protocol fields to a byte stream.
pub struct FrameWriter<W> {
    inner: W,
    ready: Option<Box<dyn Read + Send>>,
    chunk_size: usize,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a writer using eager transfer.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            ready: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Creates a writer using chunked transfer.
    ///
    /// `ready` is the peer-facing half of the stream the receiver writes its
    /// ready signals to.
    #[must_use]
    pub fn chunked(inner: W, chunk_size: usize, ready: impl Read + Send + 'static) -> Self {
        Self {
            inner,
            ready: Some(Box::new(ready)),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Writes one big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] if the stream fails.
    #[expect(clippy::big_endian_bytes, reason = "the wire format is big-endian")]
    pub fn write_u32(&mut self, value: u32) -> Result<(), ProtocolError> {
        self.inner
            .write_all(&value.to_be_bytes())
            .map_err(ProtocolError::write)
    }

    /// Writes a length-prefixed variable-width field.
    ///
    /// In chunked mode this blocks on the peer's ready signal between chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the payload length does
    /// not fit in a `u32`, or any error from the stream.
    pub fn write_variable(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let len = u32::try_from(data.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            len: data.len(),
            max: usize::try_from(u32::MAX).unwrap_or(usize::MAX),
        })?;
        self.write_u32(len)?;

        let Self {
            inner,
            ready,
            chunk_size,
        } = self;
        match ready {
            None => inner.write_all(data).map_err(ProtocolError::write),
            Some(source) => {
                for (index, chunk) in data.chunks(*chunk_size).enumerate() {
                    if index > 0 {
                        await_ready(source.as_mut())?;
                    }
                    inner.write_all(chunk).map_err(ProtocolError::write)?;
                    inner.flush().map_err(ProtocolError::write)?;
                }
                Ok(())
            }
        }
    }

    /// Writes the success marker that terminates a message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] if the stream fails.
    pub fn write_success_marker(&mut self) -> Result<(), ProtocolError> {
        self.inner
            .write_all(&SUCCESS_MARKER)
            .map_err(ProtocolError::write)
    }

    /// Flushes buffered bytes to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] if the stream fails.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        self.inner.flush().map_err(ProtocolError::write)
    }

    /// Returns a reference to the underlying stream.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the writer and returns the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn read_exact(reader: &mut (impl Read + ?Sized), buffer: &mut [u8]) -> Result<(), ProtocolError> {
    reader.read_exact(buffer).map_err(|error| {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::StreamClosed {
                expected: buffer.len(),
            }
        } else {
            ProtocolError::read(error)
        }
    })
}

#[expect(clippy::big_endian_bytes, reason = "the wire format is big-endian")]
fn signal_ready(ready: &mut (dyn Write + Send)) -> Result<(), ProtocolError> {
    ready
        .write_all(&READY_SIGNAL.to_be_bytes())
        .and_then(|()| ready.flush())
        .map_err(ProtocolError::write)
}

fn await_ready(ready: &mut (dyn Read + Send)) -> Result<(), ProtocolError> {
    // Any value counts as ready.
    let mut signal = [0_u8; 4];
    read_exact(ready, &mut signal)
}
