//! Decides, at call time, which channels are usable.

use std::sync::Arc;

use serde::Serialize;

use super::{
    BrokerPermission, CapabilityStatus, Channel, ChannelSet, PrivilegeBroker, Probe,
    ShellChannel, Unavailable,
};

/// Probes every channel on demand.
///
/// Cloning is cheap; all collaborators are shared.
#[derive(Clone)]
pub struct PrivilegeResolver {
    accessibility: Arc<dyn CapabilityStatus>,
    root_shell: Arc<dyn ShellChannel>,
    broker: Arc<dyn PrivilegeBroker>,
}

/// Per-channel probe results, for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PrivilegeResolver {
    pub fn new(
        accessibility: Arc<dyn CapabilityStatus>,
        root_shell: Arc<dyn ShellChannel>,
        broker: Arc<dyn PrivilegeBroker>,
    ) -> Self {
        Self {
            accessibility,
            root_shell,
            broker,
        }
    }

    /// Probe one channel.
    pub fn probe(&self, channel: Channel) -> Probe {
        match channel {
            Channel::Accessibility => self.probe_accessibility(),
            Channel::RootShell => self.probe_root_shell(),
            Channel::BrokeredPrivilege => self.probe_broker(),
        }
    }

    pub fn probe_accessibility(&self) -> Probe {
        if self.accessibility.is_connected() {
            Ok(())
        } else {
            Err(Unavailable::new(
                Channel::Accessibility,
                "accessibility service not connected",
            ))
        }
    }

    pub fn probe_root_shell(&self) -> Probe {
        self.root_shell.probe()
    }

    /// Broker is usable only when it answers a ping *and* has granted us
    /// permission through a protocol that supports remote processes.
    pub fn probe_broker(&self) -> Probe {
        let unavailable = |reason: &str| Err(Unavailable::new(Channel::BrokeredPrivilege, reason));
        if !self.broker.ping() {
            return unavailable("broker did not answer ping");
        }
        match self.broker.permission() {
            BrokerPermission::Granted => {}
            BrokerPermission::Denied => return unavailable("broker permission not granted"),
            BrokerPermission::Unsupported => {
                return unavailable("broker protocol has no permission model");
            }
        }
        if !self.broker.supports_remote_process() {
            return unavailable("broker does not expose remote process execution");
        }
        Ok(())
    }

    /// The set of channels usable right now.
    pub fn channels(&self) -> ChannelSet {
        let mut set = ChannelSet::default();
        for channel in Channel::all() {
            if self.probe(*channel).is_ok() {
                set.insert(*channel);
            }
        }
        tracing::debug!(?set, "resolved execution channels");
        set
    }

    /// Probe every channel and keep the reasons for unavailable ones.
    pub fn report(&self) -> Vec<ChannelReport> {
        Channel::all()
            .iter()
            .map(|channel| {
                let probe = self.probe(*channel);
                ChannelReport {
                    channel: *channel,
                    available: probe.is_ok(),
                    reason: probe.err().map(|u| u.reason),
                }
            })
            .collect()
    }

    pub(crate) fn root_shell(&self) -> &dyn ShellChannel {
        self.root_shell.as_ref()
    }

    pub(crate) fn broker(&self) -> &dyn PrivilegeBroker {
        self.broker.as_ref()
    }
}

impl std::fmt::Debug for PrivilegeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegeResolver").finish_non_exhaustive()
    }
}
