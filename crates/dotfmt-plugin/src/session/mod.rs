//! Session bootstrap: handshake, then one reader and one writer thread.
//!
//! The reader owns the [`Dispatcher`]; the writer drains the response
//! queue. When the reader stops cleanly the dispatcher is dropped, and the
//! writer exits once every in-flight format job has queued its response.
//! A failure on either side ends the session straight away.

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use dotfmt_protocol::{FrameReader, FrameWriter, SCHEMA_VERSION, accept_handshake};
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::errors::{SessionError, SessionSide};
use crate::formatter::FormatterRegistry;
use crate::writer::{ResponseQueue, ResponseSender, response_channel};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Outcome reported by a session thread.
struct Completion {
    side: SessionSide,
    result: Result<(), SessionError>,
}

/// Reports a panic if the thread unwinds before reporting its outcome.
struct CompletionGuard {
    side: SessionSide,
    done: Option<Sender<Completion>>,
}

impl CompletionGuard {
    const fn new(side: SessionSide, done: Sender<Completion>) -> Self {
        Self {
            side,
            done: Some(done),
        }
    }

    fn finish(mut self, result: Result<(), SessionError>) {
        if let Some(done) = self.done.take() {
            // The session may already have returned on the other side's error.
            drop(done.send(Completion {
                side: self.side,
                result,
            }));
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            drop(done.send(Completion {
                side: self.side,
                result: Err(SessionError::ThreadPanic { side: self.side }),
            }));
        }
    }
}

/// One plugin session over a duplex byte stream.
pub struct Session<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    formatters: FormatterRegistry,
}

impl<R, W> Session<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    /// Creates a session reading requests from `input` and writing
    /// responses to `output`.
    #[must_use]
    pub fn new(input: R, output: W, formatters: FormatterRegistry) -> Self {
        Self {
            reader: FrameReader::new(input),
            writer: FrameWriter::new(output),
            formatters,
        }
    }

    /// Runs the session until the host sends `Shutdown`.
    ///
    /// Returns the output stream after every queued response was written.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from the handshake, the reader or the
    /// writer.
    pub fn run(self) -> Result<W, SessionError> {
        let Self {
            mut reader,
            mut writer,
            formatters,
        } = self;

        accept_handshake(&mut reader, &mut writer, SCHEMA_VERSION)?;
        info!(target: SESSION_TARGET, schema = SCHEMA_VERSION, "handshake complete");

        let (responses, queue) = response_channel();
        let (done, completions) = mpsc::channel();
        let writer_thread = spawn_writer(queue, writer, done.clone())?;
        spawn_reader(reader, formatters, responses, done)?;

        wait_for_completion(&completions)?;
        match writer_thread.join() {
            Ok(Some(writer)) => Ok(writer.into_inner()),
            Ok(None) | Err(_) => Err(SessionError::ThreadPanic {
                side: SessionSide::Writer,
            }),
        }
    }
}

fn spawn_writer<W: Write + Send + 'static>(
    queue: ResponseQueue,
    writer: FrameWriter<W>,
    done: Sender<Completion>,
) -> Result<JoinHandle<Option<FrameWriter<W>>>, SessionError> {
    let side = SessionSide::Writer;
    thread::Builder::new()
        .name("response-writer".to_owned())
        .spawn(move || {
            let guard = CompletionGuard::new(side, done);
            match queue.run(writer) {
                Ok(writer) => {
                    guard.finish(Ok(()));
                    Some(writer)
                }
                Err(error) => {
                    guard.finish(Err(error.into()));
                    None
                }
            }
        })
        .map_err(|source| SessionError::Spawn {
            side,
            source: Arc::new(source),
        })
}

fn spawn_reader<R: Read + Send + 'static>(
    mut reader: FrameReader<R>,
    formatters: FormatterRegistry,
    responses: ResponseSender,
    done: Sender<Completion>,
) -> Result<(), SessionError> {
    let side = SessionSide::Reader;
    thread::Builder::new()
        .name("request-reader".to_owned())
        .spawn(move || {
            let guard = CompletionGuard::new(side, done);
            let dispatcher = Dispatcher::new(formatters, responses);
            let result = dispatcher.run(&mut reader);
            drop(dispatcher);
            guard.finish(result);
        })
        .map(drop)
        .map_err(|source| SessionError::Spawn {
            side,
            source: Arc::new(source),
        })
}

/// Waits for the reader to stop and the writer to drain, or for the first
/// failure.
fn wait_for_completion(completions: &Receiver<Completion>) -> Result<(), SessionError> {
    let mut reader_done = false;
    let mut writer_done = false;
    while !(reader_done && writer_done) {
        let pending = if reader_done {
            SessionSide::Writer
        } else {
            SessionSide::Reader
        };
        let Completion { side, result } = completions
            .recv()
            .map_err(|_| SessionError::ThreadPanic { side: pending })?;
        result?;
        debug!(target: SESSION_TARGET, %side, "session thread finished");
        match side {
            SessionSide::Reader => reader_done = true,
            SessionSide::Writer => writer_done = true,
        }
    }
    Ok(())
}
