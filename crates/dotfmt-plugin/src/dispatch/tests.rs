//! Tests for request dispatch.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use dotfmt_config::Language;
use dotfmt_protocol::{FrameWriter, HostFormatRequest, ProtocolError};
use rstest::{fixture, rstest};
use serde_json::Value;

use super::*;
use crate::test_support::{decode, encode, response_for};
use crate::writer::{ResponseQueue, response_channel};

const HANDLE: u32 = 3;

struct Harness {
    dispatcher: Dispatcher,
    queue: ResponseQueue,
}

impl Harness {
    fn with_formatters(formatters: FormatterRegistry) -> Self {
        let (sender, queue) = response_channel();
        Self {
            dispatcher: Dispatcher::new(formatters, sender),
            queue,
        }
    }

    fn send(&self, id: u32, body: MessageBody) -> Flow {
        self.dispatcher
            .dispatch(Message::new(id, body))
            .expect("dispatch")
    }

    fn register(&self, global: &str, plugin: &str) {
        self.send(
            1,
            MessageBody::RegisterConfig {
                handle: HANDLE,
                global_config: global.as_bytes().to_vec(),
                plugin_config: plugin.as_bytes().to_vec(),
            },
        );
    }

    /// Drops the dispatcher and collects everything written, waiting for
    /// outstanding format jobs.
    fn finish(self) -> Vec<Message> {
        let Self { dispatcher, queue } = self;
        drop(dispatcher);
        let writer = queue.run(FrameWriter::new(Vec::new())).expect("drain");
        decode(&writer.into_inner())
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::with_formatters(FormatterRegistry::builtin())
}

fn data_for(messages: &[Message], original: u32) -> Vec<u8> {
    match response_for(messages, original) {
        Some(MessageBody::DataResponse { data, .. }) => data.clone(),
        other => panic!("expected data response for {original}, got {other:?}"),
    }
}

fn json_for(messages: &[Message], original: u32) -> Value {
    serde_json::from_slice(&data_for(messages, original)).expect("json payload")
}

fn error_for(messages: &[Message], original: u32) -> String {
    match response_for(messages, original) {
        Some(MessageBody::ErrorResponse { data, .. }) => {
            String::from_utf8(data.clone()).expect("utf-8 error text")
        }
        other => panic!("expected error response for {original}, got {other:?}"),
    }
}

fn format_result(messages: &[Message], original: u32) -> Option<String> {
    match response_for(messages, original) {
        Some(MessageBody::FormatTextResponse { content, .. }) => content
            .clone()
            .map(|bytes| String::from_utf8(bytes).expect("utf-8 text")),
        other => panic!("expected format response for {original}, got {other:?}"),
    }
}

fn format_request(path: &str, text: &str) -> MessageBody {
    MessageBody::FormatText(FormatTextRequest {
        file_path: path.as_bytes().to_vec(),
        start_byte: 0,
        end_byte: u32::try_from(text.len()).expect("short text"),
        handle: HANDLE,
        override_config: Vec::new(),
        file_text: text.as_bytes().to_vec(),
    })
}

#[rstest]
fn active_is_acknowledged(harness: Harness) {
    assert_eq!(harness.send(10, MessageBody::Active), Flow::Continue);
    let messages = harness.finish();
    assert_eq!(
        response_for(&messages, 10),
        Some(&MessageBody::SuccessResponse { original_id: 10 })
    );
}

#[rstest]
fn shutdown_stops_the_loop_without_a_response(harness: Harness) {
    assert_eq!(harness.send(2, MessageBody::Shutdown), Flow::Shutdown);
    assert!(harness.finish().is_empty());
}

#[rstest]
fn plugin_info_lists_formatter_extensions(harness: Harness) {
    harness.send(4, MessageBody::GetPluginInfo);
    let info = json_for(&harness.finish(), 4);
    assert_eq!(info["configKey"], "dotnet");
    assert_eq!(info["fileExtensions"], serde_json::json!(["cs", "vb"]));
}

#[rstest]
fn licence_text_is_returned(harness: Harness) {
    harness.send(4, MessageBody::GetLicenseText);
    assert_eq!(data_for(&harness.finish(), 4), LICENSE_TEXT.as_bytes());
}

#[rstest]
fn diagnostics_report_unknown_properties(harness: Harness) {
    harness.register("{}", r#"{"unknownProp": false}"#);
    harness.send(
        5,
        MessageBody::GetConfigDiagnostics { handle: HANDLE },
    );
    let messages = harness.finish();
    assert_eq!(
        response_for(&messages, 1),
        Some(&MessageBody::SuccessResponse { original_id: 1 })
    );
    assert_eq!(
        json_for(&messages, 5),
        serde_json::json!([{
            "propertyName": "unknownProp",
            "message": "Unknown configuration property name.",
        }])
    );
}

#[rstest]
fn malformed_registration_is_an_error_response(harness: Harness) {
    harness.register("{", "");
    harness.send(
        5,
        MessageBody::GetConfigDiagnostics { handle: HANDLE },
    );
    let messages = harness.finish();
    assert!(!error_for(&messages, 1).is_empty());
    assert_eq!(
        error_for(&messages, 5),
        format!("Could not find configuration id: {HANDLE}")
    );
}

#[rstest]
fn releasing_an_unknown_handle_succeeds(harness: Harness) {
    harness.send(6, MessageBody::ReleaseConfig { handle: 99 });
    assert_eq!(
        response_for(&harness.finish(), 6),
        Some(&MessageBody::SuccessResponse { original_id: 6 })
    );
}

#[rstest]
fn file_matching_info_requires_a_registered_handle(harness: Harness) {
    harness.send(7, MessageBody::GetFileMatchingInfo { handle: 9 });
    harness.register("{}", "");
    harness.send(8, MessageBody::GetFileMatchingInfo { handle: HANDLE });
    let messages = harness.finish();
    assert_eq!(error_for(&messages, 7), "Could not find configuration id: 9");
    assert_eq!(
        json_for(&messages, 8),
        serde_json::json!({"fileExtensions": ["cs", "vb"], "fileNames": []})
    );
}

#[rstest]
fn resolved_config_is_flattened(harness: Harness) {
    harness.register(r#"{"indentWidth": 2}"#, r#"{"visualBasic.useTabs": true}"#);
    harness.send(9, MessageBody::GetResolvedConfig { handle: HANDLE });
    let view = json_for(&harness.finish(), 9);
    assert_eq!(view["csharp.indentationSize"], 2);
    assert_eq!(view["csharp.useTabs"], false);
    assert_eq!(view["visualBasic.useTabs"], true);
}

#[rstest]
fn config_updates_are_never_needed(harness: Harness) {
    harness.send(
        11,
        MessageBody::CheckConfigUpdates {
            plugin_config: br#"{"csharp.indentBlock": true}"#.to_vec(),
        },
    );
    assert_eq!(data_for(&harness.finish(), 11), b"[]");
}

#[rstest]
fn host_format_is_refused(harness: Harness) {
    harness.send(12, MessageBody::HostFormat(HostFormatRequest::default()));
    assert_eq!(
        error_for(&harness.finish(), 12),
        "Cannot host format with a plugin."
    );
}

#[rstest]
fn host_responses_are_ignored(harness: Harness) {
    harness.send(13, MessageBody::SuccessResponse { original_id: 1 });
    harness.send(
        14,
        MessageBody::FormatTextResponse {
            original_id: 2,
            content: None,
        },
    );
    assert!(harness.finish().is_empty());
}

#[rstest]
fn cancelling_an_unknown_request_is_silent(harness: Harness) {
    harness.send(15, MessageBody::CancelFormat { original_id: 404 });
    assert!(harness.finish().is_empty());
}

#[rstest]
fn format_uses_the_resolved_options(harness: Harness) {
    harness.register(r#"{"newLineKind": "lf"}"#, "");
    harness.send(20, format_request("src/Program.cs", "class A  \r\n{\r\n}\r\n"));
    harness.send(21, format_request("Module.VB", "Module M\nEnd Module\n"));
    let messages = harness.finish();
    assert_eq!(
        format_result(&messages, 20).as_deref(),
        Some("class A\n{\n}\n")
    );
    assert_eq!(format_result(&messages, 21), None);
}

#[rstest]
fn format_overrides_apply_to_one_request(harness: Harness) {
    harness.register(r#"{"newLineKind": "lf"}"#, "");
    let mut request = FormatTextRequest {
        file_path: b"a.cs".to_vec(),
        start_byte: 0,
        end_byte: 7,
        handle: HANDLE,
        override_config: br#"{"useTabs": true}"#.to_vec(),
        file_text: b"    x;\n".to_vec(),
    };
    harness.send(22, MessageBody::FormatText(request.clone()));
    request.override_config = Vec::new();
    harness.send(23, MessageBody::FormatText(request));
    let messages = harness.finish();
    assert_eq!(format_result(&messages, 22).as_deref(), Some("\tx;\n"));
    assert_eq!(format_result(&messages, 23), None);
}

#[rstest]
#[case::unknown_extension("notes.txt", HANDLE, "Could not find formatter for file path: notes.txt")]
#[case::unknown_handle("a.cs", 42, "Could not find configuration id: 42")]
fn format_failures_are_error_responses(
    harness: Harness,
    #[case] path: &str,
    #[case] handle: u32,
    #[case] expected: &str,
) {
    harness.register("{}", "");
    harness.send(
        24,
        MessageBody::FormatText(FormatTextRequest {
            file_path: path.as_bytes().to_vec(),
            handle,
            file_text: b"x".to_vec(),
            end_byte: 1,
            ..FormatTextRequest::default()
        }),
    );
    assert_eq!(error_for(&harness.finish(), 24), expected);
}

#[rstest]
fn format_rejects_ranges_off_a_character_boundary(harness: Harness) {
    harness.register("{}", "");
    let text = "h\u{e9}llo";
    harness.send(
        25,
        MessageBody::FormatText(FormatTextRequest {
            file_path: b"a.cs".to_vec(),
            start_byte: 2,
            end_byte: 3,
            handle: HANDLE,
            override_config: Vec::new(),
            file_text: text.as_bytes().to_vec(),
        }),
    );
    assert_eq!(
        error_for(&harness.finish(), 25),
        "invalid byte range 2..3 for text of 6 bytes"
    );
}

#[rstest]
fn released_handles_fail_later_format_requests(harness: Harness) {
    harness.register("{}", "");
    harness.send(26, MessageBody::ReleaseConfig { handle: HANDLE });
    harness.send(27, format_request("a.cs", "x\n"));
    assert_eq!(
        error_for(&harness.finish(), 27),
        format!("Could not find configuration id: {HANDLE}")
    );
}

/// Spins until cancelled, then reports it.
struct WaitForCancel;

impl CodeFormatter for WaitForCancel {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<Option<String>, FormatError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if request.cancel.is_cancelled() {
                return Err(FormatError::Cancelled);
            }
            thread::sleep(Duration::from_millis(1));
        }
        Ok(None)
    }
}

#[test]
fn cancelled_jobs_answer_with_an_error() {
    let harness = Harness::with_formatters(FormatterRegistry::new(vec![Arc::new(WaitForCancel)]));
    harness.register("{}", "");
    harness.send(30, format_request("a.cs", "x\n"));
    harness.send(31, MessageBody::CancelFormat { original_id: 30 });
    let messages = harness.finish();
    assert_eq!(error_for(&messages, 30), "format request 30 was cancelled");
    assert!(response_for(&messages, 31).is_none());
}

/// Fails by unwinding instead of returning an error.
struct Panics;

impl CodeFormatter for Panics {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn format(&self, _request: &FormatRequest<'_>) -> Result<Option<String>, FormatError> {
        std::panic::panic_any("engine exploded")
    }
}

#[test]
fn panicking_formatters_answer_with_an_error() {
    let harness = Harness::with_formatters(FormatterRegistry::new(vec![Arc::new(Panics)]));
    harness.register("{}", "");
    harness.send(50, format_request("a.cs", "x\n"));
    let cancellations = Arc::clone(&harness.dispatcher.cancellations);
    let messages = harness.finish();
    assert_eq!(error_for(&messages, 50), "formatter panicked: engine exploded");
    assert!(cancellations.is_empty());
}

/// Blocks until the test opens the gate, then reports the indent it saw.
struct Gated {
    gate: Mutex<Receiver<()>>,
}

impl CodeFormatter for Gated {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<Option<String>, FormatError> {
        self.gate
            .lock()
            .expect("gate lock")
            .recv_timeout(Duration::from_secs(10))
            .expect("gate opened");
        let indent = request.options.language(Language::CSharp).indentation_size;
        Ok(Some(indent.to_string()))
    }
}

#[test]
fn jobs_keep_options_resolved_before_a_release() {
    let (open, gate) = mpsc::channel();
    let gated = Gated {
        gate: Mutex::new(gate),
    };
    let harness = Harness::with_formatters(FormatterRegistry::new(vec![Arc::new(gated)]));
    harness.register(r#"{"indentWidth": 2}"#, "");
    harness.send(40, format_request("a.cs", "x\n"));
    harness.send(41, MessageBody::ReleaseConfig { handle: HANDLE });
    open.send(()).expect("open gate");
    let messages = harness.finish();
    assert_eq!(format_result(&messages, 40).as_deref(), Some("2"));
    assert_eq!(
        response_for(&messages, 41),
        Some(&MessageBody::SuccessResponse { original_id: 41 })
    );
}

#[rstest]
fn finished_jobs_release_their_ticket(harness: Harness) {
    harness.register(r#"{"newLineKind": "lf"}"#, "");
    harness.send(32, format_request("a.cs", "x\n"));
    let cancellations = Arc::clone(&harness.dispatcher.cancellations);
    let messages = harness.finish();
    assert_eq!(format_result(&messages, 32), None);
    assert!(cancellations.is_empty());
}

#[rstest]
fn run_stops_at_shutdown(harness: Harness) {
    let input = encode([
        MessageBody::Active,
        MessageBody::Shutdown,
        MessageBody::Active,
    ]);
    let mut reader = FrameReader::new(input.as_slice());
    harness.dispatcher.run(&mut reader).expect("clean shutdown");
    let messages = harness.finish();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        response_for(&messages, 1),
        Some(&MessageBody::SuccessResponse { original_id: 1 })
    );
}

#[rstest]
fn run_fails_when_the_stream_closes(harness: Harness) {
    let input = encode([MessageBody::Active]);
    let mut reader = FrameReader::new(input.as_slice());
    let error = harness.dispatcher.run(&mut reader).err().expect("stream closed");
    assert!(matches!(
        error,
        SessionError::Protocol(ProtocolError::StreamClosed { .. })
    ));
}
