//! Execution channels and the resolver that probes them.
//!
//! A [`Channel`] is a mechanism able to carry out a privileged or
//! semi-privileged action. Availability is time-varying (the user can revoke
//! superuser access or disconnect the accessibility service at any moment),
//! so every probe runs fresh and nothing is cached between calls.
//!
//! Probes never fail loudly: each returns a [`Probe`], which is either `Ok(())`
//! or an [`Unavailable`] carrying a reason for diagnostics.

pub mod accessibility;
pub mod broker;
pub mod resolver;
pub mod root;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use accessibility::{AccessibilityLink, AccessibilityService, CapabilityStatus, GlobalAction};
pub use broker::{BrokerError, BrokerPermission, NoBroker, PrivilegeBroker};
pub use resolver::PrivilegeResolver;
pub use root::{RootShell, ShellChannel};

/// An execution channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Accessibility automation (global actions, hosted notifications).
    Accessibility,
    /// Superuser shell.
    RootShell,
    /// Brokered-privilege IPC channel.
    BrokeredPrivilege,
}

impl Channel {
    /// Return all channel variants.
    pub fn all() -> &'static [Channel] {
        &[
            Channel::Accessibility,
            Channel::RootShell,
            Channel::BrokeredPrivilege,
        ]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::RootShell => "root_shell",
            Self::BrokeredPrivilege => "brokered_privilege",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a channel cannot be used right now.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{channel} unavailable: {reason}")]
pub struct Unavailable {
    pub channel: Channel,
    pub reason: String,
}

impl Unavailable {
    #[must_use]
    pub fn new(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }
}

/// Result of a single availability probe.
pub type Probe = std::result::Result<(), Unavailable>;

/// The set of channels usable at the instant of a probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    pub accessibility: bool,
    pub root_shell: bool,
    pub brokered_privilege: bool,
}

impl ChannelSet {
    #[must_use]
    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Accessibility => self.accessibility,
            Channel::RootShell => self.root_shell,
            Channel::BrokeredPrivilege => self.brokered_privilege,
        }
    }

    pub fn insert(&mut self, channel: Channel) {
        match channel {
            Channel::Accessibility => self.accessibility = true,
            Channel::RootShell => self.root_shell = true,
            Channel::BrokeredPrivilege => self.brokered_privilege = true,
        }
    }

    /// Whether a shell-capable channel (root or broker) is present.
    #[must_use]
    pub fn can_execute_commands(&self) -> bool {
        self.root_shell || self.brokered_privilege
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.accessibility || self.root_shell || self.brokered_privilege)
    }

    /// Iterate the contained channels in [`Channel::all`] order.
    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::all().iter().copied().filter(|c| self.contains(*c))
    }
}
