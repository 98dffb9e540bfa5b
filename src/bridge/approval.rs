//! Pending bridge requests and the surface that asks the user about them.
//!
//! A [`PendingBridgeRequest`] is consumed by exactly one decision on the
//! [`TrustGate`](super::TrustGate). Dropping it without a decision is
//! abandonment and changes nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::slots::{SlotId, SlotPatch};

/// Shows an approval prompt to the user.
///
/// The prompt is display-only: nothing has been applied yet.
pub trait ApprovalSurface: Send + Sync {
    fn present(&self, prompt: &ApprovalPrompt);
}

/// What the approval surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalPrompt {
    pub request_id: String,
    pub caller: String,
    pub tile_id: i64,
    pub label: String,
    pub action_type: String,
    /// Menu label for the requested action.
    pub action_label: String,
    /// Every field approval would write.
    pub requested: SlotPatch,
}

/// A request from an untrusted caller, waiting for approve or deny.
#[derive(Debug)]
pub struct PendingBridgeRequest {
    id: Uuid,
    caller: String,
    slot: SlotId,
    patch: SlotPatch,
    received_at: DateTime<Utc>,
}

impl PendingBridgeRequest {
    pub(crate) fn new(caller: String, slot: SlotId, patch: SlotPatch) -> Self {
        Self {
            id: Uuid::new_v4(),
            caller,
            slot,
            patch,
            received_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Fields that approval would write.
    pub fn requested(&self) -> &SlotPatch {
        &self.patch
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn prompt(&self) -> ApprovalPrompt {
        ApprovalPrompt {
            request_id: self.id.to_string(),
            caller: self.caller.clone(),
            tile_id: self.slot.wire_id(),
            label: self.patch.label.clone().unwrap_or_else(|| "N/A".to_owned()),
            action_type: self
                .patch
                .action_kind
                .map_or_else(|| "N/A".to_owned(), |kind| kind.to_string()),
            action_label: self
                .patch
                .action_kind
                .map_or("N/A", |kind| kind.label())
                .to_owned(),
            requested: self.requested().clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, SlotId, SlotPatch) {
        (self.caller, self.slot, self.patch)
    }
}
