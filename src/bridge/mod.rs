//! Bridge trust gate.
//!
//! External processes may reconfigure tiles through the bridge. A request
//! from a trusted caller is applied at once; anything else becomes a
//! [`PendingBridgeRequest`] and waits for the user:
//!
//! ```text
//! Received ──trusted──▶ Applied
//!    │
//!    └──▶ AwaitingDecision ──approve──▶ Applied
//!                          ──deny / drop──▶ Discarded
//! ```
//!
//! Validation runs before `Received`, so a bad tile id or action type leaves
//! no state behind.

pub mod approval;
pub mod request;

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::slots::{SlotId, SlotPatch};
use crate::tiles::TileStateManager;
use crate::trust::TrustStore;

pub use approval::{ApprovalPrompt, ApprovalSurface, PendingBridgeRequest};
pub use request::{BridgeRejection, BridgeRequest, SenderResolver, UNKNOWN_CALLER, resolve_caller};

/// Terminal state of a bridge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BridgeOutcome {
    Applied { caller: String, tile_id: i64 },
    Discarded { caller: String, tile_id: i64 },
}

/// Result of receiving a request.
#[derive(Debug)]
pub enum GateOutcome {
    /// Caller was trusted; fields are written.
    Applied(BridgeOutcome),
    /// Caller needs approval.
    AwaitingDecision(PendingBridgeRequest),
}

/// Guards slot writes from external callers.
pub struct TrustGate {
    tiles: Arc<TileStateManager>,
    trust: Arc<dyn TrustStore>,
    surface: Arc<dyn ApprovalSurface>,
}

impl TrustGate {
    pub fn new(
        tiles: Arc<TileStateManager>,
        trust: Arc<dyn TrustStore>,
        surface: Arc<dyn ApprovalSurface>,
    ) -> Self {
        Self {
            tiles,
            trust,
            surface,
        }
    }

    /// Validate and route an inbound request.
    ///
    /// # Errors
    ///
    /// [`QuickSlotError::BridgeRejected`](crate::error::QuickSlotError::BridgeRejected)
    /// for an invalid request, or a slot store error while applying.
    pub fn receive(
        &self,
        request: BridgeRequest,
        sender: Option<&dyn SenderResolver>,
    ) -> Result<GateOutcome> {
        let (slot, patch) = request.validate().map_err(|rejection| {
            tracing::warn!(tile_id = request.tile_id, %rejection, "bridge request rejected");
            rejection
        })?;
        let caller = resolve_caller(request.caller_package, sender);

        if self.trust.is_allowed(&caller) {
            tracing::info!(%caller, %slot, "trusted bridge request");
            return self.apply(caller, slot, &patch).map(GateOutcome::Applied);
        }

        let pending = PendingBridgeRequest::new(caller, slot, patch);
        tracing::info!(
            caller = pending.caller(),
            %slot,
            request_id = %pending.id(),
            "bridge request awaiting decision"
        );
        self.surface.present(&pending.prompt());
        Ok(GateOutcome::AwaitingDecision(pending))
    }

    /// Apply the request, then trust the caller from now on.
    ///
    /// A failed write leaves the caller untrusted.
    pub fn approve(&self, pending: PendingBridgeRequest) -> Result<BridgeOutcome> {
        let (caller, slot, patch) = pending.into_parts();
        let outcome = self.apply(caller.clone(), slot, &patch)?;
        self.trust.set_allowed(&caller, true)?;
        Ok(outcome)
    }

    /// Drop the request without touching slot or trust state.
    pub fn deny(&self, pending: PendingBridgeRequest) -> BridgeOutcome {
        let (caller, slot, _) = pending.into_parts();
        tracing::info!(%caller, %slot, "bridge request discarded");
        BridgeOutcome::Discarded {
            caller,
            tile_id: slot.wire_id(),
        }
    }

    /// Withdraw trust from `caller`.
    pub fn revoke(&self, caller: &str) -> Result<()> {
        self.trust.set_allowed(caller, false)?;
        tracing::info!(caller, "bridge trust revoked");
        Ok(())
    }

    pub fn allowed_callers(&self) -> Vec<String> {
        self.trust.list_allowed()
    }

    fn apply(&self, caller: String, slot: SlotId, patch: &SlotPatch) -> Result<BridgeOutcome> {
        patch.apply(self.tiles.store(), slot)?;
        self.tiles.request_refresh(slot);
        tracing::info!(%caller, %slot, "bridge request applied");
        Ok(BridgeOutcome::Applied {
            caller,
            tile_id: slot.wire_id(),
        })
    }
}

impl std::fmt::Debug for TrustGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustGate").finish_non_exhaustive()
    }
}
