//! Command-line interface of the plugin binary.

use clap::{Parser, ValueEnum};
use strum::{Display, EnumString};

/// Log output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display, ValueEnum)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON, one object per event.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Runtime settings. Formatting configuration arrives over the protocol.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dotfmt-plugin",
    version,
    about = "C# and Visual Basic formatting plugin speaking the binary stdio protocol"
)]
pub struct Cli {
    /// Process id of the host; the plugin exits when it disappears.
    #[arg(long, value_name = "PID")]
    pub parent_pid: u32,

    /// Tracing filter directives, e.g. `info` or `dotfmt_plugin=debug`.
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub log_filter: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
