//! Typed message catalog built on the frame codec.
//!
//! A message is `u32(id) u32(kind) <fields> u32(0xFFFFFFFF)`. Payload fields
//! stay raw bytes at this layer; JSON and UTF-8 decoding belong to the
//! dispatcher, where a failure only affects one request instead of the whole
//! stream.

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter};
use crate::error::ProtocolError;

/// Discriminant written after the message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Request completed with no payload.
    SuccessResponse = 0,
    /// Request completed with a payload.
    DataResponse = 1,
    /// Request failed with a UTF-8 message.
    ErrorResponse = 2,
    /// Peer asks the plugin to stop.
    Shutdown = 3,
    /// Liveness probe.
    Active = 4,
    /// Requests the plugin info JSON.
    GetPluginInfo = 5,
    /// Requests the licence text.
    GetLicenseText = 6,
    /// Stores configuration under a handle.
    RegisterConfig = 7,
    /// Discards the configuration under a handle.
    ReleaseConfig = 8,
    /// Requests the diagnostics of a handle.
    GetConfigDiagnostics = 9,
    /// Requests the file matching info of a handle.
    GetFileMatchingInfo = 10,
    /// Requests the resolved configuration of a handle.
    GetResolvedConfig = 11,
    /// Asks whether a plugin configuration needs migrating.
    CheckConfigUpdates = 12,
    /// Formats a file.
    FormatText = 13,
    /// Result of a format request.
    FormatTextResponse = 14,
    /// Cancels an in-flight format request.
    CancelFormat = 15,
    /// Asks the other side to format embedded text.
    HostFormat = 16,
}

impl MessageKind {
    /// Decodes a raw kind value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`] for values outside `0..=16`.
    pub const fn from_u32(kind: u32) -> Result<Self, ProtocolError> {
        let decoded = match kind {
            0 => Self::SuccessResponse,
            1 => Self::DataResponse,
            2 => Self::ErrorResponse,
            3 => Self::Shutdown,
            4 => Self::Active,
            5 => Self::GetPluginInfo,
            6 => Self::GetLicenseText,
            7 => Self::RegisterConfig,
            8 => Self::ReleaseConfig,
            9 => Self::GetConfigDiagnostics,
            10 => Self::GetFileMatchingInfo,
            11 => Self::GetResolvedConfig,
            12 => Self::CheckConfigUpdates,
            13 => Self::FormatText,
            14 => Self::FormatTextResponse,
            15 => Self::CancelFormat,
            16 => Self::HostFormat,
            _ => return Err(ProtocolError::UnknownKind { kind }),
        };
        Ok(decoded)
    }

    /// Returns the wire value of this kind.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Body of a `FormatText` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTextRequest {
    /// UTF-8 file path, used for formatter selection.
    pub file_path: Vec<u8>,
    /// Byte offset where the range to format starts.
    pub start_byte: u32,
    /// Byte offset where the range to format ends.
    pub end_byte: u32,
    /// Configuration handle to resolve options from.
    pub handle: u32,
    /// JSON object of per-request overrides; empty means none.
    pub override_config: Vec<u8>,
    /// UTF-8 file contents.
    pub file_text: Vec<u8>,
}

/// Body of a `HostFormat` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFormatRequest {
    /// UTF-8 file path of the embedded text.
    pub file_path: Vec<u8>,
    /// Byte offset where the range to format starts.
    pub start_byte: u32,
    /// Byte offset where the range to format ends.
    pub end_byte: u32,
    /// JSON object of overrides.
    pub override_config: Vec<u8>,
    /// UTF-8 text to format.
    pub file_text: Vec<u8>,
}

/// Kind-specific message contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// The request `original_id` succeeded.
    SuccessResponse {
        /// Id of the request being answered.
        original_id: u32,
    },
    /// The request `original_id` succeeded with a payload.
    DataResponse {
        /// Id of the request being answered.
        original_id: u32,
        /// Response payload.
        data: Vec<u8>,
    },
    /// The request `original_id` failed.
    ErrorResponse {
        /// Id of the request being answered.
        original_id: u32,
        /// UTF-8 error text.
        data: Vec<u8>,
    },
    /// Stop processing and exit.
    Shutdown,
    /// Liveness probe.
    Active,
    /// Plugin info request.
    GetPluginInfo,
    /// Licence text request.
    GetLicenseText,
    /// Configuration registration.
    RegisterConfig {
        /// Handle chosen by the host.
        handle: u32,
        /// JSON global configuration.
        global_config: Vec<u8>,
        /// JSON plugin configuration map.
        plugin_config: Vec<u8>,
    },
    /// Configuration release.
    ReleaseConfig {
        /// Handle to release.
        handle: u32,
    },
    /// Diagnostics request.
    GetConfigDiagnostics {
        /// Handle to inspect.
        handle: u32,
    },
    /// File matching info request.
    GetFileMatchingInfo {
        /// Handle to inspect.
        handle: u32,
    },
    /// Resolved configuration request.
    GetResolvedConfig {
        /// Handle to inspect.
        handle: u32,
    },
    /// Configuration migration check.
    CheckConfigUpdates {
        /// JSON plugin configuration map to check.
        plugin_config: Vec<u8>,
    },
    /// Format request.
    FormatText(FormatTextRequest),
    /// Format result for the request `original_id`.
    FormatTextResponse {
        /// Id of the request being answered.
        original_id: u32,
        /// New text, or `None` when nothing changed.
        content: Option<Vec<u8>>,
    },
    /// Cancels the format request `original_id`.
    CancelFormat {
        /// Id of the format request to cancel.
        original_id: u32,
    },
    /// Host format request.
    HostFormat(HostFormatRequest),
}

impl MessageBody {
    /// Returns the kind written for this body.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::SuccessResponse { .. } => MessageKind::SuccessResponse,
            Self::DataResponse { .. } => MessageKind::DataResponse,
            Self::ErrorResponse { .. } => MessageKind::ErrorResponse,
            Self::Shutdown => MessageKind::Shutdown,
            Self::Active => MessageKind::Active,
            Self::GetPluginInfo => MessageKind::GetPluginInfo,
            Self::GetLicenseText => MessageKind::GetLicenseText,
            Self::RegisterConfig { .. } => MessageKind::RegisterConfig,
            Self::ReleaseConfig { .. } => MessageKind::ReleaseConfig,
            Self::GetConfigDiagnostics { .. } => MessageKind::GetConfigDiagnostics,
            Self::GetFileMatchingInfo { .. } => MessageKind::GetFileMatchingInfo,
            Self::GetResolvedConfig { .. } => MessageKind::GetResolvedConfig,
            Self::CheckConfigUpdates { .. } => MessageKind::CheckConfigUpdates,
            Self::FormatText(_) => MessageKind::FormatText,
            Self::FormatTextResponse { .. } => MessageKind::FormatTextResponse,
            Self::CancelFormat { .. } => MessageKind::CancelFormat,
            Self::HostFormat(_) => MessageKind::HostFormat,
        }
    }

    fn read_fields<R: Read>(
        kind: MessageKind,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        let body = match kind {
            MessageKind::SuccessResponse => Self::SuccessResponse {
                original_id: reader.read_u32()?,
            },
            MessageKind::DataResponse => Self::DataResponse {
                original_id: reader.read_u32()?,
                data: reader.read_variable()?,
            },
            MessageKind::ErrorResponse => Self::ErrorResponse {
                original_id: reader.read_u32()?,
                data: reader.read_variable()?,
            },
            MessageKind::Shutdown => Self::Shutdown,
            MessageKind::Active => Self::Active,
            MessageKind::GetPluginInfo => Self::GetPluginInfo,
            MessageKind::GetLicenseText => Self::GetLicenseText,
            MessageKind::RegisterConfig => Self::RegisterConfig {
                handle: reader.read_u32()?,
                global_config: reader.read_variable()?,
                plugin_config: reader.read_variable()?,
            },
            MessageKind::ReleaseConfig => Self::ReleaseConfig {
                handle: reader.read_u32()?,
            },
            MessageKind::GetConfigDiagnostics => Self::GetConfigDiagnostics {
                handle: reader.read_u32()?,
            },
            MessageKind::GetFileMatchingInfo => Self::GetFileMatchingInfo {
                handle: reader.read_u32()?,
            },
            MessageKind::GetResolvedConfig => Self::GetResolvedConfig {
                handle: reader.read_u32()?,
            },
            MessageKind::CheckConfigUpdates => Self::CheckConfigUpdates {
                plugin_config: reader.read_variable()?,
            },
            MessageKind::FormatText => Self::FormatText(FormatTextRequest {
                file_path: reader.read_variable()?,
                start_byte: reader.read_u32()?,
                end_byte: reader.read_u32()?,
                handle: reader.read_u32()?,
                override_config: reader.read_variable()?,
                file_text: reader.read_variable()?,
            }),
            MessageKind::FormatTextResponse => {
                let original_id = reader.read_u32()?;
                let content = match reader.read_u32()? {
                    0 => None,
                    1 => Some(reader.read_variable()?),
                    flag => return Err(ProtocolError::UnknownFormatResponseFlag { flag }),
                };
                Self::FormatTextResponse {
                    original_id,
                    content,
                }
            }
            MessageKind::CancelFormat => Self::CancelFormat {
                original_id: reader.read_u32()?,
            },
            MessageKind::HostFormat => Self::HostFormat(HostFormatRequest {
                file_path: reader.read_variable()?,
                start_byte: reader.read_u32()?,
                end_byte: reader.read_u32()?,
                override_config: reader.read_variable()?,
                file_text: reader.read_variable()?,
            }),
        };
        Ok(body)
    }

    fn write_fields<W: Write>(&self, writer: &mut FrameWriter<W>) -> Result<(), ProtocolError> {
        match self {
            Self::Shutdown | Self::Active | Self::GetPluginInfo | Self::GetLicenseText => Ok(()),
            Self::SuccessResponse { original_id } | Self::CancelFormat { original_id } => {
                writer.write_u32(*original_id)
            }
            Self::DataResponse { original_id, data } | Self::ErrorResponse { original_id, data } => {
                writer.write_u32(*original_id)?;
                writer.write_variable(data)
            }
            Self::RegisterConfig {
                handle,
                global_config,
                plugin_config,
            } => {
                writer.write_u32(*handle)?;
                writer.write_variable(global_config)?;
                writer.write_variable(plugin_config)
            }
            Self::ReleaseConfig { handle }
            | Self::GetConfigDiagnostics { handle }
            | Self::GetFileMatchingInfo { handle }
            | Self::GetResolvedConfig { handle } => writer.write_u32(*handle),
            Self::CheckConfigUpdates { plugin_config } => writer.write_variable(plugin_config),
            Self::FormatText(request) => {
                writer.write_variable(&request.file_path)?;
                writer.write_u32(request.start_byte)?;
                writer.write_u32(request.end_byte)?;
                writer.write_u32(request.handle)?;
                writer.write_variable(&request.override_config)?;
                writer.write_variable(&request.file_text)
            }
            Self::FormatTextResponse {
                original_id,
                content,
            } => {
                writer.write_u32(*original_id)?;
                match content {
                    None => writer.write_u32(0),
                    Some(text) => {
                        writer.write_u32(1)?;
                        writer.write_variable(text)
                    }
                }
            }
            Self::HostFormat(request) => {
                writer.write_variable(&request.file_path)?;
                writer.write_u32(request.start_byte)?;
                writer.write_u32(request.end_byte)?;
                writer.write_variable(&request.override_config)?;
                writer.write_variable(&request.file_text)
            }
        }
    }
}

/// One framed protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: u32,
    body: MessageBody,
}

impl Message {
    /// Creates a message with the sender-assigned `id`.
    #[must_use]
    pub const fn new(id: u32, body: MessageBody) -> Self {
        Self { id, body }
    }

    /// Sender-assigned message id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Message contents.
    #[must_use]
    pub const fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Message kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// Consumes the message and returns its body.
    #[must_use]
    pub fn into_body(self) -> MessageBody {
        self.body
    }

    /// Reads one complete message, including its success marker.
    ///
    /// # Errors
    ///
    /// Every error is fatal for the stream: short reads, unknown kinds,
    /// unknown format-response flags and corrupt success markers.
    pub fn read<R: Read>(reader: &mut FrameReader<R>) -> Result<Self, ProtocolError> {
        let id = reader.read_u32()?;
        let kind = MessageKind::from_u32(reader.read_u32()?)?;
        let body = MessageBody::read_fields(kind, reader)?;
        reader.read_success_marker()?;
        Ok(Self { id, body })
    }

    /// Writes the message, its success marker, and flushes.
    ///
    /// # Errors
    ///
    /// Returns any write failure from the underlying stream.
    pub fn write<W: Write>(&self, writer: &mut FrameWriter<W>) -> Result<(), ProtocolError> {
        writer.write_u32(self.id)?;
        writer.write_u32(self.kind().as_u32())?;
        self.body.write_fields(writer)?;
        writer.write_success_marker()?;
        writer.flush()
    }
}
