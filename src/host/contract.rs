//! Versioned host command/event envelopes.

use serde::{Deserialize, Serialize};

/// Contract version for host command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Commands accepted by the host router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "host.version")]
    HostVersion,
    #[serde(rename = "privilege.status")]
    PrivilegeStatus,
    #[serde(rename = "accessibility.connect")]
    AccessibilityConnect,
    #[serde(rename = "accessibility.disconnect")]
    AccessibilityDisconnect,
    #[serde(rename = "slot.get")]
    SlotGet,
    #[serde(rename = "slot.trigger")]
    SlotTrigger,
    #[serde(rename = "action.dispatch")]
    ActionDispatch,
    #[serde(rename = "bridge.update_tile")]
    BridgeUpdateTile,
    #[serde(rename = "approval.respond")]
    ApprovalRespond,
    #[serde(rename = "trust.list")]
    TrustList,
    #[serde(rename = "trust.revoke")]
    TrustRevoke,
    #[serde(rename = "runtime.stop")]
    RuntimeStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::HostVersion => "host.version",
            Self::PrivilegeStatus => "privilege.status",
            Self::AccessibilityConnect => "accessibility.connect",
            Self::AccessibilityDisconnect => "accessibility.disconnect",
            Self::SlotGet => "slot.get",
            Self::SlotTrigger => "slot.trigger",
            Self::ActionDispatch => "action.dispatch",
            Self::BridgeUpdateTile => "bridge.update_tile",
            Self::ApprovalRespond => "approval.respond",
            Self::TrustList => "trust.list",
            Self::TrustRevoke => "trust.revoke",
            Self::RuntimeStop => "runtime.stop",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "host.ping" => Some(Self::HostPing),
            "host.version" => Some(Self::HostVersion),
            "privilege.status" => Some(Self::PrivilegeStatus),
            "accessibility.connect" => Some(Self::AccessibilityConnect),
            "accessibility.disconnect" => Some(Self::AccessibilityDisconnect),
            "slot.get" => Some(Self::SlotGet),
            "slot.trigger" => Some(Self::SlotTrigger),
            "action.dispatch" => Some(Self::ActionDispatch),
            "bridge.update_tile" => Some(Self::BridgeUpdateTile),
            "approval.respond" => Some(Self::ApprovalRespond),
            "trust.list" => Some(Self::TrustList),
            "trust.revoke" => Some(Self::TrustRevoke),
            "runtime.stop" => Some(Self::RuntimeStop),
            _ => None,
        }
    }
}

/// Outbound event names.
pub mod events {
    pub const NOTIFICATION_SHOW: &str = "notification.show";
    pub const TILE_REFRESH: &str = "tile.refresh";
    pub const BRIDGE_APPROVAL_REQUESTED: &str = "bridge.approval_requested";
    pub const BRIDGE_APPLIED: &str = "bridge.applied";
    pub const BRIDGE_DISCARDED: &str = "bridge.discarded";
    pub const PLATFORM_LAUNCH: &str = "platform.launch";
    pub const PLATFORM_TORCH: &str = "platform.torch";
    pub const PLATFORM_MAIN_SURFACE: &str = "platform.main_surface";
    pub const PLATFORM_GLOBAL_ACTION: &str = "platform.global_action";
}

/// A versioned response envelope from host to frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from frontend to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and request id.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::UnsupportedVersion { got: self.v });
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::BlankRequestId);
        }
        Ok(())
    }
}

/// A versioned event envelope from host to frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Why an envelope was refused before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("unsupported contract version {got}; expected {}", EVENT_VERSION)]
    UnsupportedVersion { got: u32 },
    #[error("request_id cannot be empty")]
    BlankRequestId,
}
