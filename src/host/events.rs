//! Event fan-out for the host bridge.
//!
//! The headless host cannot launch apps, toggle a torch or draw tiles
//! itself; it forwards those requests to the connected shell as events.

use tokio::sync::broadcast;

use crate::bridge::{ApprovalPrompt, ApprovalSurface};
use crate::dispatch::{NavigationRequest, Platform};
use crate::error::Result;
use crate::privilege::{AccessibilityService, GlobalAction};
use crate::host::contract::{EventEnvelope, events};
use crate::slots::SlotId;
use crate::tiles::TileRefresher;

/// Cloneable handle onto the outbound event broadcast.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn emit(&self, event: &str, payload: serde_json::Value) {
        let envelope = EventEnvelope::new(uuid::Uuid::new_v4().to_string(), event, payload);
        if self.tx.send(envelope).is_err() {
            tracing::trace!(event, "no event subscribers");
        }
    }
}

impl TileRefresher for EventSink {
    fn request_refresh(&self, slot: SlotId) {
        self.emit(
            events::TILE_REFRESH,
            serde_json::json!({ "tile_id": slot.wire_id() }),
        );
    }
}

impl ApprovalSurface for EventSink {
    fn present(&self, prompt: &ApprovalPrompt) {
        let payload = serde_json::to_value(prompt).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize approval prompt");
            serde_json::Value::Null
        });
        self.emit(events::BRIDGE_APPROVAL_REQUESTED, payload);
    }
}

/// [`Platform`] that asks the connected shell to do the work.
#[derive(Debug, Clone)]
pub struct EventPlatform {
    sink: EventSink,
}

impl EventPlatform {
    #[must_use]
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl Platform for EventPlatform {
    fn launch(&self, request: &NavigationRequest) -> Result<()> {
        let payload = serde_json::to_value(request).map_err(|e| {
            crate::error::QuickSlotError::Platform(format!("unserializable launch request: {e}"))
        })?;
        self.sink.emit(events::PLATFORM_LAUNCH, payload);
        Ok(())
    }

    fn default_launch_target(&self, package: &str) -> Option<NavigationRequest> {
        Some(NavigationRequest::LaunchPackage {
            package: package.to_owned(),
        })
    }

    fn set_torch(&self, enabled: bool) -> Result<()> {
        self.sink
            .emit(events::PLATFORM_TORCH, serde_json::json!({ "enabled": enabled }));
        Ok(())
    }

    fn show_message(&self, message: &str) {
        self.sink.emit(
            events::NOTIFICATION_SHOW,
            serde_json::json!({ "message": message, "channel": "direct" }),
        );
    }

    fn open_main_surface(&self) -> Result<()> {
        self.sink
            .emit(events::PLATFORM_MAIN_SURFACE, serde_json::json!({}));
        Ok(())
    }
}

/// [`AccessibilityService`] backed by the shell's accessibility service.
///
/// Installed by `accessibility.connect`; global actions and hosted
/// messages are forwarded as events.
#[derive(Debug, Clone)]
pub struct EventAccessibility {
    sink: EventSink,
}

impl EventAccessibility {
    #[must_use]
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl AccessibilityService for EventAccessibility {
    fn perform_global_action(&self, action: GlobalAction) -> bool {
        self.sink.emit(
            events::PLATFORM_GLOBAL_ACTION,
            serde_json::json!({ "action": action }),
        );
        true
    }

    fn show_message(&self, message: &str) {
        self.sink.emit(
            events::NOTIFICATION_SHOW,
            serde_json::json!({ "message": message, "channel": "accessibility" }),
        );
    }
}
