//! Entrypoint for the `dotfmt-plugin` binary.
//!
//! Delegates to [`dotfmt_plugin::run`]. Stdout carries the protocol, so
//! nothing else may write to it.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    dotfmt_plugin::run(std::env::args_os(), &mut stderr)
}
