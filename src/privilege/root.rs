//! Superuser shell channel.
//!
//! The shell is driven through its stdin: the command followed by `exit` is
//! written, stdin is closed, and the process is waited on with a deadline.
//! Output is discarded; only the exit status matters.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::QuickSlotConfig;
use crate::executor::ExecFailure;

use super::{Channel, Probe, Unavailable};

/// Poll interval while waiting for the shell to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A shell able to run commands with elevated privileges.
pub trait ShellChannel: Send + Sync {
    /// Side-effect-free availability check.
    fn probe(&self) -> Probe;

    /// Run `command` and wait for it. `Ok(())` iff it exited with status 0.
    fn run(&self, command: &str) -> Result<(), ExecFailure>;
}

/// Process-backed superuser shell (`su` by default).
#[derive(Debug, Clone)]
pub struct RootShell {
    su_binary: String,
    command_timeout: Duration,
    probe_timeout: Duration,
}

impl RootShell {
    #[must_use]
    pub fn new(
        su_binary: impl Into<String>,
        command_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            su_binary: su_binary.into(),
            command_timeout,
            probe_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &QuickSlotConfig) -> Self {
        Self::new(
            config.executor.su_binary.clone(),
            config.executor.command_timeout(),
            config.probe.root_probe_timeout(),
        )
    }

    /// Spawn the shell, feed it `script`, and wait up to `timeout`.
    fn run_script(&self, script: &str, timeout: Duration) -> Result<(), ExecFailure> {
        let mut child = Command::new(&self.su_binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExecFailure::Spawn(format!("{}: {e}", self.su_binary)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin
                .write_all(script.as_bytes())
                .and_then(|()| stdin.flush());
            // Dropping stdin closes the pipe so the shell sees EOF.
            drop(stdin);
            if let Err(e) = written {
                reap(&mut child);
                return Err(ExecFailure::Io(format!("failed to write to shell: {e}")));
            }
        }

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return match status.code() {
                        Some(0) => Ok(()),
                        Some(code) => Err(ExecFailure::NonZeroExit(code)),
                        None => Err(ExecFailure::Signalled),
                    };
                }
                Ok(None) => {
                    if start.elapsed() > timeout {
                        reap(&mut child);
                        return Err(ExecFailure::TimedOut(timeout));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    reap(&mut child);
                    return Err(ExecFailure::Io(format!("failed to wait for shell: {e}")));
                }
            }
        }
    }
}

impl ShellChannel for RootShell {
    fn probe(&self) -> Probe {
        self.run_script("exit\n", self.probe_timeout)
            .map_err(|failure| Unavailable::new(Channel::RootShell, failure.to_string()))
    }

    fn run(&self, command: &str) -> Result<(), ExecFailure> {
        let script = format!("{command}\nexit\n");
        self.run_script(&script, self.command_timeout)
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
