//! Single-writer response queue.
//!
//! Format jobs finish on their own threads, so every outgoing message goes
//! through one unbounded channel to a single writer. The writer assigns ids
//! at write time, which keeps them monotonic on the wire, and writes each
//! message whole so frames never interleave.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};

use dotfmt_protocol::{FrameWriter, Message, MessageBody, ProtocolError};
use tracing::{debug, trace};

use crate::errors::{RequestError, SessionError};
use crate::ids::IdGenerator;

const WRITER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::writer");

/// Creates a connected sender and queue.
#[must_use]
pub fn response_channel() -> (ResponseSender, ResponseQueue) {
    let (sender, receiver) = mpsc::channel();
    (
        ResponseSender { queue: sender },
        ResponseQueue {
            queue: receiver,
            ids: IdGenerator::new(),
        },
    )
}

/// Cloneable handle for enqueuing outgoing messages.
#[derive(Debug, Clone)]
pub struct ResponseSender {
    queue: Sender<MessageBody>,
}

impl ResponseSender {
    /// Enqueues `body`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WriterStopped`] once the queue has gone away.
    pub fn send(&self, body: MessageBody) -> Result<(), SessionError> {
        self.queue
            .send(body)
            .map_err(|_| SessionError::WriterStopped)
    }

    /// Answers `original_id` with a success response.
    ///
    /// # Errors
    ///
    /// See [`ResponseSender::send`].
    pub fn send_success(&self, original_id: u32) -> Result<(), SessionError> {
        self.send(MessageBody::SuccessResponse { original_id })
    }

    /// Answers `original_id` with a data response.
    ///
    /// # Errors
    ///
    /// See [`ResponseSender::send`].
    pub fn send_data(&self, original_id: u32, data: Vec<u8>) -> Result<(), SessionError> {
        self.send(MessageBody::DataResponse { original_id, data })
    }

    /// Answers `original_id` with the rendered `error`.
    ///
    /// # Errors
    ///
    /// See [`ResponseSender::send`].
    pub fn send_error(&self, original_id: u32, error: &RequestError) -> Result<(), SessionError> {
        self.send(MessageBody::ErrorResponse {
            original_id,
            data: error.report().into_bytes(),
        })
    }

    /// Answers the format request `original_id`.
    ///
    /// # Errors
    ///
    /// See [`ResponseSender::send`].
    pub fn send_format_response(
        &self,
        original_id: u32,
        content: Option<Vec<u8>>,
    ) -> Result<(), SessionError> {
        self.send(MessageBody::FormatTextResponse {
            original_id,
            content,
        })
    }
}

/// Receiving end drained by the writer thread.
#[derive(Debug)]
pub struct ResponseQueue {
    queue: Receiver<MessageBody>,
    ids: IdGenerator,
}

impl ResponseQueue {
    /// Writes queued messages until every [`ResponseSender`] is dropped.
    ///
    /// Returns the writer once the queue is drained.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; the queue is dropped with it, so
    /// later sends report [`SessionError::WriterStopped`].
    pub fn run<W: Write>(self, mut writer: FrameWriter<W>) -> Result<FrameWriter<W>, ProtocolError> {
        let Self { queue, ids } = self;
        for body in queue {
            let message = Message::new(ids.next_id(), body);
            trace!(
                target: WRITER_TARGET,
                id = message.id(),
                kind = ?message.kind(),
                "writing message"
            );
            message.write(&mut writer)?;
        }
        debug!(target: WRITER_TARGET, "response queue drained");
        Ok(writer)
    }
}
