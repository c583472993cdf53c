//! Parent-process supervision.
//!
//! The host passes its pid on the command line. A background thread polls
//! it and runs the exit hook once it has gone, so an orphaned plugin never
//! lingers.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, info, warn};

const PARENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::parent");

/// How often the parent is polled.
pub const PARENT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// The liveness probe itself failed.
#[derive(Debug, Error)]
#[error("failed to check whether process {pid} is running: {source}")]
pub struct ProbeError {
    /// Process that was probed.
    pub pid: u32,
    /// Errno reported by the probe.
    #[source]
    pub source: Errno,
}

/// Answers whether a process is still running.
pub trait ProcessProbe: Send + Sync {
    /// Returns whether `pid` is running.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the answer cannot be determined.
    fn is_alive(&self, pid: u32) -> Result<bool, ProbeError>;
}

/// Probes with a null signal, which checks existence without delivering
/// anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalProbe;

impl ProcessProbe for SignalProbe {
    fn is_alive(&self, pid: u32) -> Result<bool, ProbeError> {
        let Ok(raw) = i32::try_from(pid) else {
            return Ok(false);
        };
        if raw == 0 {
            return Ok(false);
        }
        match kill(Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => Ok(true),
            Err(Errno::ESRCH | Errno::ECHILD) => Ok(false),
            Err(source) => Err(ProbeError { pid, source }),
        }
    }
}

/// Returns whether the parent should be treated as running.
///
/// An inconclusive probe counts as running; the next poll tries again.
pub fn parent_is_alive(probe: &dyn ProcessProbe, pid: u32) -> bool {
    match probe.is_alive(pid) {
        Ok(alive) => alive,
        Err(error) => {
            warn!(target: PARENT_TARGET, pid, %error, "parent liveness check failed");
            true
        }
    }
}

/// Spawns the watcher thread.
///
/// `on_exit` runs once, on the watcher thread, after the parent is found to
/// have gone.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be started.
pub fn watch_parent<P, F>(
    pid: u32,
    probe: P,
    interval: Duration,
    on_exit: F,
) -> io::Result<JoinHandle<()>>
where
    P: ProcessProbe + 'static,
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name("parent-watch".to_owned())
        .spawn(move || {
            debug!(target: PARENT_TARGET, pid, ?interval, "watching parent process");
            while parent_is_alive(&probe, pid) {
                thread::sleep(interval);
            }
            info!(target: PARENT_TARGET, pid, "parent process exited");
            on_exit();
        })
}
