//! Wire helpers shared by the crate's unit tests.

use dotfmt_protocol::{FrameReader, FrameWriter, Message, MessageBody, ProtocolError};

/// Decodes every complete message in `bytes`.
pub(crate) fn decode(bytes: &[u8]) -> Vec<Message> {
    let mut reader = FrameReader::new(bytes);
    let mut messages = Vec::new();
    loop {
        match Message::read(&mut reader) {
            Ok(message) => messages.push(message),
            Err(ProtocolError::StreamClosed { .. }) => return messages,
            Err(error) => panic!("corrupt output: {error}"),
        }
    }
}

/// Encodes `bodies` as consecutive messages with ids starting at 1.
pub(crate) fn encode(bodies: impl IntoIterator<Item = MessageBody>) -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    for (id, body) in (1_u32..).zip(bodies) {
        Message::new(id, body).write(&mut writer).expect("encode");
    }
    writer.into_inner()
}

/// The response in `messages` that answers the request `original`.
pub(crate) fn response_for(messages: &[Message], original: u32) -> Option<&MessageBody> {
    messages.iter().map(Message::body).find(|body| match body {
        MessageBody::SuccessResponse { original_id }
        | MessageBody::DataResponse { original_id, .. }
        | MessageBody::ErrorResponse { original_id, .. }
        | MessageBody::FormatTextResponse { original_id, .. } => *original_id == original,
        _ => false,
    })
}
