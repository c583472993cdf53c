//! Binary wire protocol spoken between a formatting host and `dotfmt-plugin`.
//!
//! Every message travels over a single duplex byte stream (the plugin's
//! stdin and stdout) as a frame of big-endian `u32` fields:
//!
//! ```text
//! u32(id) u32(kind) <kind-specific fields> u32(0xFFFFFFFF)
//! ```
//!
//! Variable-width fields are a `u32` length followed by that many bytes. The
//! trailing success marker exists only to detect stream corruption; a wrong
//! marker means the stream can no longer be trusted and the session must end.
//!
//! The crate is split in three layers:
//!
//! - [`codec`]: the [`FrameReader`] and [`FrameWriter`] primitives, including
//!   the stop-and-wait chunked transfer mode used by older schema versions.
//! - [`message`]: the typed [`Message`] catalog built on the codec.
//! - [`handshake`]: the schema-negotiation exchange that precedes ordinary
//!   traffic.
//!
//! # Example
//!
//! ```
//! use dotfmt_protocol::{FrameReader, FrameWriter, Message, MessageBody};
//!
//! let mut writer = FrameWriter::new(Vec::new());
//! Message::new(1, MessageBody::Active).write(&mut writer)?;
//!
//! let bytes = writer.into_inner();
//! let mut reader = FrameReader::new(bytes.as_slice());
//! let message = Message::read(&mut reader)?;
//! assert_eq!(message.id(), 1);
//! assert_eq!(message.body(), &MessageBody::Active);
//! # Ok::<(), dotfmt_protocol::ProtocolError>(())
//! ```

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;

pub use self::codec::{FrameReader, FrameWriter, SUCCESS_MARKER, TransferMode};
pub use self::error::ProtocolError;
pub use self::handshake::{SCHEMA_VERSION, accept_handshake, initiate_handshake};
pub use self::message::{FormatTextRequest, HostFormatRequest, Message, MessageBody, MessageKind};
