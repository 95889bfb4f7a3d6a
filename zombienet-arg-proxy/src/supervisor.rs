//! Launching the collator and tying its lifetime to the proxy's.

use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

use crate::args::CommandSections;
use crate::error::ProxyError;

/// How supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child exited on its own with this code.
    Exited(i32),
    /// The child was terminated by a signal.
    Killed(Option<Signal>),
    /// The proxy received a shutdown signal and handed it to the child.
    Forwarded(Signal),
}

impl Termination {
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::Killed(_) => 1,
            Termination::Forwarded(_) => 0,
        }
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Termination::Exited(code),
            None => Termination::Killed(status.signal().and_then(|s| Signal::try_from(s).ok())),
        }
    }
}

/// Listeners for the signals that shut the proxy down.
///
/// Must be installed before the child is spawned, otherwise a signal arriving
/// in between would kill the proxy with the default action and orphan the child.
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    pub fn install() -> Result<Self, ProxyError> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(ProxyError::Signals)?,
            terminate: signal(SignalKind::terminate()).map_err(ProxyError::Signals)?,
            hangup: signal(SignalKind::hangup()).map_err(ProxyError::Signals)?,
        })
    }

    pub async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.interrupt.recv() => Signal::SIGINT,
            _ = self.terminate.recv() => Signal::SIGTERM,
            _ = self.hangup.recv() => Signal::SIGHUP,
        }
    }
}

/// Spawns the command with its own arguments, a bare `--` and the relay arguments.
pub fn launch(sections: &CommandSections) -> Result<Child, ProxyError> {
    let command = sections.command();
    let args = sections.child_args();
    info!(command, ?args, "launching");

    Command::new(command)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| ProxyError::Spawn {
            command: command.to_string(),
            source,
        })
}

/// Waits for the child to exit or for `shutdown` to yield a signal, whichever
/// comes first. A shutdown signal is delivered to the child before returning,
/// without waiting for the child to act on it.
pub async fn supervise(
    child: &mut Child,
    shutdown: impl Future<Output = Signal>,
) -> Result<Termination, ProxyError> {
    let pid = child.id();

    tokio::select! {
        status = child.wait() => {
            let termination = Termination::from(status.map_err(ProxyError::Wait)?);
            match termination {
                Termination::Killed(signal) => warn!(?signal, "child terminated by signal"),
                _ => debug!(?termination, "child exited"),
            }
            Ok(termination)
        }
        signal = shutdown => {
            forward(pid, signal);
            Ok(Termination::Forwarded(signal))
        }
    }
}

fn forward(pid: Option<u32>, signal: Signal) {
    let Some(pid) = pid else {
        debug!(%signal, "child already reaped, nothing to forward");
        return;
    };
    info!(%signal, pid, "forwarding signal to child");
    if let Err(err) = kill(Pid::from_raw(pid as i32), signal) {
        warn!(%signal, pid, %err, "failed to forward signal");
    }
}
