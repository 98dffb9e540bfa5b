//! Privileged command execution with channel fallback.
//!
//! Channel order is fixed: the brokered-privilege channel when it is usable,
//! otherwise the root shell. When neither is usable nothing is spawned and the
//! outcome is [`CommandOutcome::Unavailable`].
//!
//! [`CommandExecutor::run`] blocks until the command exits or times out. Call
//! it from a worker thread (e.g. `tokio::task::spawn_blocking`), never from a
//! UI-facing thread.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::privilege::{Channel, PrivilegeResolver};

/// Why a command that reached a channel did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExecFailure {
    #[error("failed to spawn shell: {0}")]
    Spawn(String),
    #[error("shell I/O error: {0}")]
    Io(String),
    #[error("command exited with code {0}")]
    NonZeroExit(i32),
    #[error("command terminated by signal")]
    Signalled,
    #[error("command timed out after {}s", .0.as_secs_f32())]
    TimedOut(#[serde(serialize_with = "serialize_secs")] Duration),
    #[error("broker error: {0}")]
    Broker(String),
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Structured result of [`CommandExecutor::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// No shell-capable channel; nothing was run.
    Unavailable,
    /// The command reached `channel` but did not succeed.
    Failed {
        channel: Channel,
        failure: ExecFailure,
    },
    /// The command exited with status 0 on `channel`.
    Succeeded { channel: Channel },
}

impl CommandOutcome {
    /// Collapse to the boolean success signal.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Channel the command ran on, if any.
    #[must_use]
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Self::Unavailable => None,
            Self::Failed { channel, .. } | Self::Succeeded { channel } => Some(*channel),
        }
    }
}

/// Runs shell commands through the best available privileged channel.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    resolver: Arc<PrivilegeResolver>,
}

impl CommandExecutor {
    pub fn new(resolver: Arc<PrivilegeResolver>) -> Self {
        Self { resolver }
    }

    /// Pick a channel and run `command` on it.
    pub fn run(&self, command: &str) -> CommandOutcome {
        let outcome = if self.resolver.probe_broker().is_ok() {
            self.run_brokered(command)
        } else if self.resolver.probe_root_shell().is_ok() {
            self.run_root(command)
        } else {
            tracing::debug!("no privileged channel available; command not run");
            CommandOutcome::Unavailable
        };

        match &outcome {
            CommandOutcome::Succeeded { channel } => {
                tracing::info!(%channel, "privileged command succeeded");
            }
            CommandOutcome::Failed { channel, failure } => {
                tracing::warn!(%channel, %failure, "privileged command failed");
            }
            CommandOutcome::Unavailable => {}
        }
        outcome
    }

    fn run_brokered(&self, command: &str) -> CommandOutcome {
        let channel = Channel::BrokeredPrivilege;
        match self.resolver.broker().run_process(&["sh", "-c", command]) {
            Ok(0) => CommandOutcome::Succeeded { channel },
            Ok(code) => CommandOutcome::Failed {
                channel,
                failure: ExecFailure::NonZeroExit(code),
            },
            Err(e) => CommandOutcome::Failed {
                channel,
                failure: ExecFailure::Broker(e.to_string()),
            },
        }
    }

    fn run_root(&self, command: &str) -> CommandOutcome {
        let channel = Channel::RootShell;
        match self.resolver.root_shell().run(command) {
            Ok(()) => CommandOutcome::Succeeded { channel },
            Err(failure) => CommandOutcome::Failed { channel, failure },
        }
    }
}
