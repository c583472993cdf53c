//! Schema negotiation that precedes ordinary message traffic.
//!
//! The host writes `u32(0)`. The plugin answers `u32(0)` (success) followed
//! by `u32(schema_version)`. Only then do framed messages start to flow.

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter};
use crate::error::ProtocolError;

/// Schema version this crate speaks.
pub const SCHEMA_VERSION: u32 = 4;

const HANDSHAKE_REQUEST: u32 = 0;
const HANDSHAKE_SUCCESS: u32 = 0;

/// Answers the host's schema request. Plugin side.
///
/// # Errors
///
/// Returns [`ProtocolError::UnexpectedHandshake`] when the first value is
/// not the schema request, or any stream failure.
pub fn accept_handshake<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    schema_version: u32,
) -> Result<(), ProtocolError> {
    let found = reader.read_u32()?;
    if found != HANDSHAKE_REQUEST {
        return Err(ProtocolError::UnexpectedHandshake { found });
    }
    writer.write_u32(HANDSHAKE_SUCCESS)?;
    writer.write_u32(schema_version)?;
    writer.flush()
}

/// Requests the peer's schema version. Host side.
///
/// # Errors
///
/// Returns [`ProtocolError::HandshakeRejected`] when the peer does not answer
/// with the success code, or any stream failure.
pub fn initiate_handshake<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
) -> Result<u32, ProtocolError> {
    writer.write_u32(HANDSHAKE_REQUEST)?;
    writer.flush()?;
    let found = reader.read_u32()?;
    if found != HANDSHAKE_SUCCESS {
        return Err(ProtocolError::HandshakeRejected { found });
    }
    reader.read_u32()
}
