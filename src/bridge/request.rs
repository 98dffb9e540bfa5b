//! Inbound bridge requests and their validation.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::slots::{IconSpec, SlotId, SlotPatch};

/// Caller label used when no identity can be resolved.
pub const UNKNOWN_CALLER: &str = "External App";

/// A slot configuration request from another process.
///
/// Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub tile_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
    /// Identity the caller claims for itself.
    #[serde(
        default,
        rename = "caller_package",
        alias = "callerPackage",
        skip_serializing_if = "Option::is_none"
    )]
    pub caller_package: Option<String>,
}

/// Why a request never reached the trust gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeRejection {
    #[error("tile id {0} is outside 1..=20")]
    TileOutOfRange(i64),
    #[error("unknown action type {0:?}")]
    UnknownAction(String),
}

/// Resolves a caller identity from the transport's sender credential.
pub trait SenderResolver {
    fn sender_identity(&self) -> Option<String>;
}

impl<F> SenderResolver for F
where
    F: Fn() -> Option<String>,
{
    fn sender_identity(&self) -> Option<String> {
        self()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Pick the caller identity: explicit field, then sender credential, then
/// [`UNKNOWN_CALLER`].
pub fn resolve_caller(explicit: Option<String>, sender: Option<&dyn SenderResolver>) -> String {
    non_blank(explicit)
        .or_else(|| non_blank(sender.and_then(|s| s.sender_identity())))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_owned())
}

impl BridgeRequest {
    /// Check the target slot and action type, yielding the slot and the
    /// fields to write.
    pub fn validate(&self) -> Result<(SlotId, SlotPatch), BridgeRejection> {
        let slot = SlotId::tile(self.tile_id).ok_or(BridgeRejection::TileOutOfRange(self.tile_id))?;
        let action_kind = self
            .action_type
            .as_deref()
            .map(|raw| {
                raw.parse::<ActionKind>()
                    .map_err(|_| BridgeRejection::UnknownAction(raw.to_owned()))
            })
            .transpose()?;

        let patch = SlotPatch {
            label: self.label.clone(),
            subtitle: self.subtitle.clone(),
            action_kind,
            action_value: self.action_value.clone(),
            icon: self.icon_uri.clone().map(IconSpec::Gallery),
        };
        Ok((slot, patch))
    }
}
