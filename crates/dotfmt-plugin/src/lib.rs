//! Out-of-process C# and Visual Basic formatting plugin.
//!
//! The host launches the binary with `--parent-pid` and talks to it over
//! stdin and stdout using the framed protocol in [`dotfmt_protocol`]. After
//! the schema handshake the [`Session`] runs two threads:
//!
//! - a reader that decodes requests and hands them to the [`Dispatcher`],
//!   which answers control requests inline and starts one job thread per
//!   format request;
//! - a writer that drains the single response queue, so frames from
//!   concurrent jobs never interleave.
//!
//! Configuration lives in a [`dotfmt_config::ConfigStore`] keyed by the
//! host's handles. Format jobs are cooperatively cancellable through the
//! [`CancellationRegistry`]. Logs go to stderr only.

pub mod cancellation;
pub mod cli;
pub mod dispatch;
mod errors;
pub mod formatter;
mod ids;
pub mod info;
pub mod parent;
pub mod session;
pub mod telemetry;
pub mod writer;

#[cfg(test)]
mod test_support;

use std::ffi::OsString;
use std::io::{self, BufWriter, Write};
use std::process::{self, ExitCode};

use clap::Parser;
use tracing::{error, info};

pub use self::cancellation::{CancellationRegistry, CancellationToken};
pub use self::cli::{Cli, LogFormat};
pub use self::dispatch::{Dispatcher, Flow};
pub use self::errors::{RequestError, SessionError, SessionSide};
pub use self::formatter::{CodeFormatter, FormatError, FormatRequest, FormatterRegistry};
pub use self::ids::IdGenerator;
pub use self::parent::{PARENT_POLL_INTERVAL, ProcessProbe, SignalProbe};
pub use self::session::Session;
pub use self::telemetry::{TelemetryError, TelemetryHandle};

const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Exit code used when the host process disappears.
pub const PARENT_GONE_EXIT_CODE: i32 = 1;

/// Runs the plugin on the process's stdin and stdout.
///
/// Argument errors and telemetry failures are reported on `stderr`;
/// everything after telemetry starts is logged.
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(parse_error) => {
            let rendered = parse_error.render();
            drop(write!(stderr, "{rendered}"));
            return if parse_error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(telemetry_error) = telemetry::initialise(&cli.log_filter, cli.log_format) {
        drop(writeln!(stderr, "{}: {telemetry_error}", env!("CARGO_PKG_NAME")));
        return ExitCode::FAILURE;
    }
    info!(
        target: RUN_TARGET,
        version = env!("CARGO_PKG_VERSION"),
        parent_pid = cli.parent_pid,
        "plugin starting"
    );

    if let Err(spawn_error) = parent::watch_parent(
        cli.parent_pid,
        SignalProbe,
        PARENT_POLL_INTERVAL,
        || process::exit(PARENT_GONE_EXIT_CODE),
    ) {
        error!(target: RUN_TARGET, error = %spawn_error, "failed to start parent watcher");
        return ExitCode::FAILURE;
    }

    let output = BufWriter::new(io::stdout());
    match Session::new(io::stdin(), output, FormatterRegistry::builtin()).run() {
        Ok(_) => {
            info!(target: RUN_TARGET, "session ended");
            ExitCode::SUCCESS
        }
        Err(session_error) => {
            error!(target: RUN_TARGET, error = %session_error, "session failed");
            ExitCode::FAILURE
        }
    }
}
