//! Accessibility automation link.
//!
//! The accessibility service is owned by the platform and comes and goes
//! with the user's settings. [`AccessibilityLink`] is the injected handle the
//! core talks to: the platform calls [`connect`](AccessibilityLink::connect)
//! and [`disconnect`](AccessibilityLink::disconnect), and observers follow the
//! status through a `watch` subscription.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// Read-only view of whether a capability is connected.
pub trait CapabilityStatus: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// System-wide actions an accessibility service can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalAction {
    TakeScreenshot,
    LockScreen,
    PowerDialog,
}

/// Operations exposed by a connected accessibility service.
pub trait AccessibilityService: Send + Sync {
    /// Perform a global action. Returns `false` when the platform refused it.
    fn perform_global_action(&self, action: GlobalAction) -> bool;

    /// Show a short message hosted by the service.
    ///
    /// Messages posted here survive the calling surface being torn down.
    fn show_message(&self, message: &str);
}

/// Shared status cell plus the currently connected service, if any.
pub struct AccessibilityLink {
    status_tx: watch::Sender<bool>,
    service: RwLock<Option<Arc<dyn AccessibilityService>>>,
}

impl AccessibilityLink {
    /// Create a disconnected link.
    #[must_use]
    pub fn new() -> Self {
        let (status_tx, _status_rx) = watch::channel(false);
        Self {
            status_tx,
            service: RwLock::new(None),
        }
    }

    /// Attach a connected service and publish `true` to subscribers.
    pub fn connect(&self, service: Arc<dyn AccessibilityService>) {
        *self.service.write().unwrap_or_else(|e| e.into_inner()) = Some(service);
        self.status_tx.send_replace(true);
        tracing::info!("accessibility service connected");
    }

    /// Detach the service and publish `false` to subscribers.
    pub fn disconnect(&self) {
        *self.service.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.status_tx.send_replace(false);
        tracing::info!("accessibility service disconnected");
    }

    /// Subscribe to connection status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status_tx.subscribe()
    }

    /// The connected service, or `None` while disconnected.
    #[must_use]
    pub fn service(&self) -> Option<Arc<dyn AccessibilityService>> {
        if !self.is_connected() {
            return None;
        }
        self.service
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for AccessibilityLink {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityStatus for AccessibilityLink {
    fn is_connected(&self) -> bool {
        *self.status_tx.borrow()
    }
}

impl std::fmt::Debug for AccessibilityLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessibilityLink")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
