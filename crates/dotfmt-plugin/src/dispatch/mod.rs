//! Request dispatch for the reading loop.
//!
//! Control requests are answered inline, in arrival order. A format request
//! is validated and its options resolved inline too, so a release that
//! arrives later cannot affect it; only the formatting itself runs on a job
//! thread. Every outgoing message goes through the [`ResponseSender`].

use std::io::Read;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use dotfmt_config::{
    ConfigError, ConfigHandle, ConfigStore, GlobalConfig, ResolvedContext, parse_key_map,
};
use dotfmt_protocol::{FormatTextRequest, FrameReader, Message, MessageBody};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancellation::{CancellationRegistry, CancellationToken};
use crate::errors::{RequestError, SessionError};
use crate::formatter::{
    CodeFormatter, FormatError, FormatRequest, FormatterRegistry, byte_range_to_char_range,
};
use crate::info::{FileMatchingInfo, LICENSE_TEXT, PluginInfo};
use crate::writer::ResponseSender;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Whether the reading loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next message.
    Continue,
    /// The host asked the plugin to stop.
    Shutdown,
}

/// Inline outcome of a request.
#[derive(Debug)]
enum Reply {
    Success,
    Data(Vec<u8>),
    /// Answered later by a format job, or never answered at all.
    Nothing,
}

/// Routes decoded messages to the store, the cancellation registry and the
/// formatters.
pub struct Dispatcher {
    store: ConfigStore,
    formatters: FormatterRegistry,
    cancellations: Arc<CancellationRegistry>,
    responses: ResponseSender,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty configuration store.
    #[must_use]
    pub fn new(formatters: FormatterRegistry, responses: ResponseSender) -> Self {
        Self {
            store: ConfigStore::new(),
            formatters,
            cancellations: Arc::new(CancellationRegistry::new()),
            responses,
        }
    }

    /// Reads and dispatches messages until the host sends `Shutdown`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] for any undecodable frame and
    /// [`SessionError::WriterStopped`] if responses can no longer be queued.
    pub fn run<R: Read>(&self, reader: &mut FrameReader<R>) -> Result<(), SessionError> {
        loop {
            let message = Message::read(reader)?;
            if self.dispatch(message)? == Flow::Shutdown {
                return Ok(());
            }
        }
    }

    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WriterStopped`] if the response cannot be
    /// queued. Request failures are answered, not returned.
    pub fn dispatch(&self, message: Message) -> Result<Flow, SessionError> {
        let id = message.id();
        debug!(target: DISPATCH_TARGET, id, kind = ?message.kind(), "message received");

        let outcome = match message.into_body() {
            MessageBody::Shutdown => {
                info!(target: DISPATCH_TARGET, id, "shutdown requested");
                return Ok(Flow::Shutdown);
            }
            MessageBody::Active => Ok(Reply::Success),
            MessageBody::GetPluginInfo => {
                json_reply(&PluginInfo::new(self.formatters.file_extensions()))
            }
            MessageBody::GetLicenseText => Ok(Reply::Data(LICENSE_TEXT.as_bytes().to_vec())),
            MessageBody::RegisterConfig {
                handle,
                global_config,
                plugin_config,
            } => self.register(ConfigHandle::new(handle), &global_config, &plugin_config),
            MessageBody::ReleaseConfig { handle } => {
                self.store.release(ConfigHandle::new(handle));
                Ok(Reply::Success)
            }
            MessageBody::GetConfigDiagnostics { handle } => self
                .store
                .diagnostics(ConfigHandle::new(handle))
                .map_err(RequestError::from)
                .and_then(|diagnostics| json_reply(&diagnostics)),
            MessageBody::GetFileMatchingInfo { handle } => {
                self.file_matching_info(ConfigHandle::new(handle))
            }
            MessageBody::GetResolvedConfig { handle } => self
                .store
                .resolved_config(ConfigHandle::new(handle))
                .map_err(RequestError::from)
                .and_then(|view| json_reply(&view)),
            MessageBody::CheckConfigUpdates { plugin_config } => {
                check_config_updates(&plugin_config)
            }
            MessageBody::FormatText(request) => {
                self.start_format(id, request).map(|()| Reply::Nothing)
            }
            MessageBody::CancelFormat { original_id } => {
                self.cancellations.cancel(original_id);
                Ok(Reply::Nothing)
            }
            MessageBody::HostFormat(_) => Err(RequestError::HostFormatUnsupported),
            MessageBody::SuccessResponse { original_id }
            | MessageBody::DataResponse { original_id, .. }
            | MessageBody::ErrorResponse { original_id, .. }
            | MessageBody::FormatTextResponse { original_id, .. } => {
                debug!(target: DISPATCH_TARGET, id, original_id, "ignoring host response");
                Ok(Reply::Nothing)
            }
        };

        self.respond(id, outcome)?;
        Ok(Flow::Continue)
    }

    fn respond(&self, id: u32, outcome: Result<Reply, RequestError>) -> Result<(), SessionError> {
        match outcome {
            Ok(Reply::Success) => self.responses.send_success(id),
            Ok(Reply::Data(data)) => self.responses.send_data(id, data),
            Ok(Reply::Nothing) => Ok(()),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, id, error = %error, "request failed");
                self.responses.send_error(id, &error)
            }
        }
    }

    fn register(
        &self,
        handle: ConfigHandle,
        global_config: &[u8],
        plugin_config: &[u8],
    ) -> Result<Reply, RequestError> {
        let global = GlobalConfig::from_json(global_config)?;
        let plugin = parse_key_map(plugin_config)?;
        self.store.register(handle, global, plugin);
        Ok(Reply::Success)
    }

    fn file_matching_info(&self, handle: ConfigHandle) -> Result<Reply, RequestError> {
        if !self.store.contains(handle) {
            return Err(ConfigError::HandleNotFound { handle }.into());
        }
        json_reply(&FileMatchingInfo::by_extension(
            self.formatters.file_extensions(),
        ))
    }

    fn start_format(&self, id: u32, request: FormatTextRequest) -> Result<(), RequestError> {
        let FormatTextRequest {
            file_path,
            start_byte,
            end_byte,
            handle,
            override_config,
            file_text,
        } = request;
        let path = String::from_utf8(file_path).map_err(|source| RequestError::InvalidUtf8 {
            field: "file path",
            source,
        })?;
        let text = String::from_utf8(file_text).map_err(|source| RequestError::InvalidUtf8 {
            field: "file text",
            source,
        })?;
        let overrides = parse_key_map(&override_config)?;
        let context = self.store.resolve(ConfigHandle::new(handle), &overrides)?;
        let formatter = self.formatters.select(&path)?;
        let range = byte_range_to_char_range(&text, start_byte, end_byte)?;

        let cancel = CancellationToken::new();
        self.cancellations.register(id, cancel.clone());
        debug!(
            target: DISPATCH_TARGET,
            id,
            path = %path,
            language = formatter.language().display_name(),
            ?range,
            "starting format job"
        );
        let job = FormatJob {
            id,
            text,
            range,
            context,
            formatter,
            cancel,
            cancellations: Arc::clone(&self.cancellations),
            responses: self.responses.clone(),
        };
        thread::Builder::new()
            .name(format!("format-{id}"))
            .spawn(move || job.run())
            .map(drop)
            .map_err(|source| {
                self.cancellations.take(id);
                RequestError::SpawnJob {
                    source: Arc::new(source),
                }
            })
    }
}

/// Everything a format job needs, detached from the reading loop.
struct FormatJob {
    id: u32,
    text: String,
    range: Option<Range<usize>>,
    context: Arc<ResolvedContext>,
    formatter: Arc<dyn CodeFormatter>,
    cancel: CancellationToken,
    cancellations: Arc<CancellationRegistry>,
    responses: ResponseSender,
}

impl FormatJob {
    fn run(self) {
        let Self {
            id,
            text,
            range,
            context,
            formatter,
            cancel,
            cancellations,
            responses,
        } = self;
        let request = FormatRequest {
            text: &text,
            range,
            options: context.options(),
            cancel: &cancel,
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| formatter.format(&request)))
            .unwrap_or_else(|payload| Err(FormatError::from_panic(&*payload)));
        cancellations.take(id);

        let sent = match result {
            Ok(content) => {
                debug!(target: DISPATCH_TARGET, id, changed = content.is_some(), "format finished");
                responses.send_format_response(id, content.map(String::into_bytes))
            }
            Err(FormatError::Cancelled) => {
                debug!(target: DISPATCH_TARGET, id, "format cancelled");
                responses.send_error(id, &RequestError::Cancelled { id })
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, id, error = %error, "format failed");
                responses.send_error(id, &RequestError::from(error))
            }
        };
        if let Err(error) = sent {
            warn!(target: DISPATCH_TARGET, id, error = %error, "format response dropped");
        }
    }
}

fn json_reply(value: &impl Serialize) -> Result<Reply, RequestError> {
    serde_json::to_vec(value)
        .map(Reply::Data)
        .map_err(RequestError::serialise)
}

/// This plugin has never renamed a property, so there is nothing to migrate.
fn check_config_updates(plugin_config: &[u8]) -> Result<Reply, RequestError> {
    parse_key_map(plugin_config)?;
    Ok(Reply::Data(b"[]".to_vec()))
}

#[cfg(test)]
mod tests;
