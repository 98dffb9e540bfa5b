//! Host bridge: the versioned JSON protocol through which a UI shell and
//! external callers reach the core.

pub mod channel;
pub mod contract;
pub mod events;
pub mod stdio;

use std::sync::Arc;

use crate::bridge::TrustGate;
use crate::config::HostConfig;
use crate::dispatch::DispatchEngine;
use crate::privilege::{AccessibilityLink, PrivilegeBroker, PrivilegeResolver, ShellChannel};
use crate::slots::SlotStore;
use crate::tiles::TileStateManager;
use crate::trust::TrustStore;

use channel::CommandRouter;
use events::{EventPlatform, EventSink};

/// Collaborators the host wires together.
pub struct HostCollaborators {
    pub slots: Arc<dyn SlotStore>,
    pub trust: Arc<dyn TrustStore>,
    pub accessibility: Arc<AccessibilityLink>,
    pub root_shell: Arc<dyn ShellChannel>,
    pub broker: Arc<dyn PrivilegeBroker>,
}

/// Assemble resolver, engine, tile manager and trust gate behind a router
/// whose platform calls, tile refreshes and approval prompts become events.
pub fn build_router(collaborators: HostCollaborators, host: &HostConfig) -> Arc<CommandRouter> {
    let HostCollaborators {
        slots,
        trust,
        accessibility,
        root_shell,
        broker,
    } = collaborators;

    let sink = EventSink::new(host.event_capacity);
    let resolver = Arc::new(PrivilegeResolver::new(
        accessibility.clone(),
        root_shell,
        broker,
    ));
    let engine = Arc::new(DispatchEngine::new(
        resolver,
        accessibility,
        Arc::new(EventPlatform::new(sink.clone())),
    ));
    let tiles = Arc::new(
        TileStateManager::new(slots, engine).with_refresher(Arc::new(sink.clone())),
    );
    let gate = Arc::new(TrustGate::new(
        Arc::clone(&tiles),
        trust,
        Arc::new(sink.clone()),
    ));
    Arc::new(CommandRouter::new(tiles, gate, sink).with_approval_ttl(host.approval_ttl()))
}
