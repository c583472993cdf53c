//! Log output for the plugin process.
//!
//! stdout belongs to the host protocol, so every event is written to stderr.
//! The subscriber is an [`EnvFilter`] in front of a single `fmt` layer in the
//! format chosen on the command line.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, registry};

use crate::cli::LogFormat;

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Proof that logging is installed, carrying the format that won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format of the installed subscriber. Later calls to [`initialise`]
    /// cannot change it.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `--log-filter` did not parse.
    #[error("invalid log filter '{directives}': {source}")]
    Filter {
        /// The rejected filter text.
        directives: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Installs the stderr subscriber once per process.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for unparseable `directives`, or
/// [`TelemetryError::Subscriber`] if some other code already installed a
/// global subscriber.
pub fn initialise(directives: &str, format: LogFormat) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| install(directives, format).map(|()| format))
        .map(|installed| TelemetryHandle { format: *installed })
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::Filter {
        directives: directives.to_owned(),
        source,
    })
}

fn install(directives: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_thread_names(true)
        .with_timer(UtcTime::rfc_3339());
    let base = registry().with(parse_filter(directives)?);

    match format {
        LogFormat::Json => base.with(stderr_layer.json().flatten_event(true)).try_init()?,
        LogFormat::Compact => base.with(stderr_layer.compact()).try_init()?,
    }
    Ok(())
}
