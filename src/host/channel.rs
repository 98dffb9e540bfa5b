//! Host command channel and router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::action::ActionKind;
use crate::bridge::{BridgeOutcome, BridgeRequest, GateOutcome, PendingBridgeRequest, TrustGate};
use crate::error::{QuickSlotError, Result};
use crate::host::contract::{
    CommandEnvelope, CommandName, EVENT_VERSION, EventEnvelope, ResponseEnvelope, events,
};
use crate::host::events::{EventAccessibility, EventSink};
use crate::slots::SlotId;
use crate::tiles::TileStateManager;

/// How long an undecided bridge request is kept by default.
pub const DEFAULT_APPROVAL_TTL: Duration = Duration::from_secs(300);

/// Routes host commands to the tile manager and trust gate.
///
/// [`route`](Self::route) may block on a privileged command; the server runs
/// it on the blocking pool.
///
/// At most one request per caller waits for a decision. A newer request
/// supersedes the older one, and requests older than the approval TTL are
/// discarded before each command is routed.
pub struct CommandRouter {
    tiles: Arc<TileStateManager>,
    gate: Arc<TrustGate>,
    events: EventSink,
    pending: Mutex<HashMap<String, PendingBridgeRequest>>,
    approval_ttl: Duration,
}

impl CommandRouter {
    pub fn new(tiles: Arc<TileStateManager>, gate: Arc<TrustGate>, events: EventSink) -> Self {
        Self {
            tiles,
            gate,
            events,
            pending: Mutex::new(HashMap::new()),
            approval_ttl: DEFAULT_APPROVAL_TTL,
        }
    }

    #[must_use]
    pub fn with_approval_ttl(mut self, ttl: Duration) -> Self {
        self.approval_ttl = ttl;
        self
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Number of bridge requests waiting for a decision.
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Discard every pending request received more than the approval TTL
    /// before `now`. Returns how many were dropped.
    pub fn discard_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<(String, PendingBridgeRequest)> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let ids: Vec<String> = pending
                .iter()
                .filter(|(_, request)| {
                    now.signed_duration_since(request.received_at())
                        .to_std()
                        .is_ok_and(|age| age > self.approval_ttl)
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove_entry(&id))
                .collect()
        };
        let count = expired.len();
        for (approval_id, request) in expired {
            self.discard(&approval_id, request, "expired");
        }
        count
    }

    /// Route a command envelope to its handler.
    pub fn route(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        self.discard_expired(Utc::now());
        match envelope.command {
            CommandName::HostPing => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"pong": true}),
            )),
            CommandName::HostVersion => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({
                    "contract_version": EVENT_VERSION,
                    "package_version": env!("CARGO_PKG_VERSION"),
                    "channel": "quickslot_host_v1"
                }),
            )),
            CommandName::PrivilegeStatus => self.handle_privilege_status(envelope),
            CommandName::AccessibilityConnect => {
                self.tiles
                    .engine()
                    .accessibility()
                    .connect(Arc::new(EventAccessibility::new(self.events.clone())));
                Ok(ResponseEnvelope::ok(
                    envelope.request_id.clone(),
                    serde_json::json!({"connected": true}),
                ))
            }
            CommandName::AccessibilityDisconnect => {
                self.tiles.engine().accessibility().disconnect();
                Ok(ResponseEnvelope::ok(
                    envelope.request_id.clone(),
                    serde_json::json!({"connected": false}),
                ))
            }
            CommandName::SlotGet => self.handle_slot_get(envelope),
            CommandName::SlotTrigger => self.handle_slot_trigger(envelope),
            CommandName::ActionDispatch => self.handle_action_dispatch(envelope),
            CommandName::BridgeUpdateTile => self.handle_bridge_update(envelope),
            CommandName::ApprovalRespond => self.handle_approval_respond(envelope),
            CommandName::TrustList => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({ "callers": self.gate.allowed_callers() }),
            )),
            CommandName::TrustRevoke => self.handle_trust_revoke(envelope),
            CommandName::RuntimeStop => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"stopping": true}),
            )),
        }
    }

    fn handle_privilege_status(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let engine = self.tiles.engine();
        let channels = engine.resolver().report();
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({
                "channels": to_json(&channels)?,
                "can_execute_commands": engine.resolver().channels().can_execute_commands(),
            }),
        ))
    }

    fn handle_slot_get(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let slot = parse_slot_id(&envelope.payload, "slot.get")?;
        let config = self.tiles.slot(slot)?;
        let view = self.tiles.tile_view(slot)?;
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({
                "slot": to_json(&config)?,
                "view": to_json(&view)?,
            }),
        ))
    }

    fn handle_slot_trigger(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let slot = parse_slot_id(&envelope.payload, "slot.trigger")?;
        let result = match slot {
            SlotId::Assistant => self.tiles.trigger_assistant()?,
            SlotId::Tile(_) => self.tiles.trigger(slot, None)?,
        };
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({
                "tile_id": slot.wire_id(),
                "result": to_json(&result)?,
            }),
        ))
    }

    fn handle_action_dispatch(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let raw_kind = parse_non_empty_field(&envelope.payload, "action_type", "action.dispatch")?;
        let kind: ActionKind = raw_kind
            .parse()
            .map_err(|e| QuickSlotError::InvalidRequest(format!("action.dispatch: {e}")))?;
        let value = envelope
            .payload
            .get("action_value")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        let result = self.tiles.engine().dispatch(kind, value, None);
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({
                "action_type": kind,
                "result": to_json(&result)?,
            }),
        ))
    }

    fn handle_bridge_update(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let request: BridgeRequest = serde_json::from_value(envelope.payload.clone())
            .map_err(|e| QuickSlotError::InvalidRequest(format!("bridge.update_tile: {e}")))?;
        // Identity the transport vouches for, as opposed to the self-declared
        // caller_package.
        let sender_field = envelope
            .payload
            .get("sender")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        let sender = move || sender_field.clone();

        match self.gate.receive(request, Some(&sender))? {
            GateOutcome::Applied(outcome) => {
                self.emit_outcome(&outcome, None, None);
                Ok(ResponseEnvelope::ok(
                    envelope.request_id.clone(),
                    to_json(&outcome)?,
                ))
            }
            GateOutcome::AwaitingDecision(pending) => {
                let request_id = pending.id().to_string();
                let payload = serde_json::json!({
                    "state": "awaiting_decision",
                    "approval_id": &request_id,
                    "caller": pending.caller(),
                    "tile_id": pending.slot().wire_id(),
                });
                let superseded: Vec<(String, PendingBridgeRequest)> = {
                    let mut waiting = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                    let ids: Vec<String> = waiting
                        .iter()
                        .filter(|(_, older)| older.caller() == pending.caller())
                        .map(|(id, _)| id.clone())
                        .collect();
                    let superseded = ids
                        .into_iter()
                        .filter_map(|id| waiting.remove_entry(&id))
                        .collect();
                    waiting.insert(request_id, pending);
                    superseded
                };
                for (approval_id, older) in superseded {
                    self.discard(&approval_id, older, "superseded");
                }
                Ok(ResponseEnvelope::ok(envelope.request_id.clone(), payload))
            }
        }
    }

    fn handle_approval_respond(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let approval_id =
            parse_non_empty_field(&envelope.payload, "approval_id", "approval.respond")?;
        let Some(approved) = envelope
            .payload
            .get("approved")
            .and_then(serde_json::Value::as_bool)
        else {
            return Err(QuickSlotError::InvalidRequest(
                "approval.respond requires payload.approved (bool)".to_owned(),
            ));
        };

        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&approval_id)
            .ok_or_else(|| {
                QuickSlotError::InvalidRequest(format!(
                    "no pending bridge request `{approval_id}`"
                ))
            })?;

        let outcome = if approved {
            let outcome = self.gate.approve(pending)?;
            self.emit_outcome(&outcome, Some(approval_id.as_str()), None);
            outcome
        } else {
            let outcome = self.gate.deny(pending);
            self.emit_outcome(&outcome, Some(approval_id.as_str()), Some("denied"));
            outcome
        };
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            to_json(&outcome)?,
        ))
    }

    fn handle_trust_revoke(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let caller = parse_non_empty_field(&envelope.payload, "caller", "trust.revoke")?;
        self.gate.revoke(&caller)?;
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"revoked": caller}),
        ))
    }

    fn discard(&self, approval_id: &str, pending: PendingBridgeRequest, reason: &str) {
        tracing::info!(approval_id, reason, "pending bridge request dropped");
        let outcome = self.gate.deny(pending);
        self.emit_outcome(&outcome, Some(approval_id), Some(reason));
    }

    fn emit_outcome(&self, outcome: &BridgeOutcome, approval_id: Option<&str>, reason: Option<&str>) {
        let event = match outcome {
            BridgeOutcome::Applied { .. } => events::BRIDGE_APPLIED,
            BridgeOutcome::Discarded { .. } => events::BRIDGE_DISCARDED,
        };
        match serde_json::to_value(outcome) {
            Ok(mut payload) => {
                if let Some(fields) = payload.as_object_mut() {
                    if let Some(id) = approval_id {
                        fields.insert("approval_id".to_owned(), id.into());
                    }
                    if let Some(reason) = reason {
                        fields.insert("reason".to_owned(), reason.into());
                    }
                }
                self.events.emit(event, payload);
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize bridge outcome"),
        }
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| QuickSlotError::Channel(e.to_string()))
}

fn parse_non_empty_field(
    payload: &serde_json::Value,
    field: &str,
    command: &str,
) -> Result<String> {
    let Some(raw) = payload.get(field).and_then(serde_json::Value::as_str) else {
        return Err(QuickSlotError::InvalidRequest(format!(
            "{command} requires payload.{field}"
        )));
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QuickSlotError::InvalidRequest(format!(
            "{command} requires a non-empty {field}"
        )));
    }
    Ok(trimmed.to_owned())
}

fn parse_slot_id(payload: &serde_json::Value, command: &str) -> Result<SlotId> {
    let Some(raw) = payload.get("tile_id").and_then(serde_json::Value::as_i64) else {
        return Err(QuickSlotError::InvalidRequest(format!(
            "{command} requires payload.tile_id (integer)"
        )));
    };
    SlotId::from_wire(raw).ok_or_else(|| {
        QuickSlotError::InvalidRequest(format!(
            "{command}: tile_id {raw} is not 1..=20 or -1 (assistant)"
        ))
    })
}

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<Result<ResponseEnvelope>>,
}

#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
    events: EventSink,
}

impl HostCommandClient {
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate().map_err(|e| {
            QuickSlotError::InvalidRequest(format!(
                "invalid host command envelope {}: {}",
                envelope.request_id, e
            ))
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| {
                QuickSlotError::Channel(format!("failed to send host command request: {e}"))
            })?;

        response_rx
            .await
            .map_err(|e| QuickSlotError::Channel(format!("host command response dropped: {e}")))?
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }
}

pub struct HostCommandServer {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    router: Arc<CommandRouter>,
}

#[must_use]
pub fn command_channel(
    request_capacity: usize,
    router: Arc<CommandRouter>,
) -> (HostCommandClient, HostCommandServer) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));
    (
        HostCommandClient {
            request_tx,
            events: router.events().clone(),
        },
        HostCommandServer { request_rx, router },
    )
}

impl HostCommandServer {
    /// Serve requests one at a time until every client is dropped.
    ///
    /// Routing errors become error responses carrying the request id.
    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            let router = Arc::clone(&self.router);
            let envelope = request.envelope;
            let request_id = envelope.request_id.clone();
            let command = envelope.command;

            let routed = tokio::task::spawn_blocking(move || router.route(&envelope))
                .await
                .map_err(|e| QuickSlotError::Channel(format!("router task failed: {e}")))
                .and_then(|r| r);
            let response = routed.or_else(|e| {
                tracing::warn!(command = command.as_str(), error = %e, "host command failed");
                Ok(ResponseEnvelope::error(request_id, e.to_string()))
            });
            let _ = request.response_tx.send(response);
        }
    }
}
