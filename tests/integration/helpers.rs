//! Shared helpers for integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use quickslot::QuickSlotError;
use quickslot::executor::ExecFailure;
use quickslot::host::channel::CommandRouter;
use quickslot::host::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
use quickslot::config::HostConfig;
use quickslot::host::{HostCollaborators, build_router};
use quickslot::privilege::{
    AccessibilityLink, BrokerError, BrokerPermission, Channel, NoBroker, PrivilegeBroker,
    ShellChannel,
};
use quickslot::privilege::{Probe, Unavailable};
use quickslot::action::ActionKind;
use quickslot::slots::{FileSlotStore, SlotId, SlotPatch};
use quickslot::trust::FileTrustStore;
use tokio::sync::broadcast;

/// Root shell stand-in that records every command it is asked to run.
#[derive(Default)]
pub(crate) struct RecordingShell {
    pub available: bool,
    pub fail_with: Option<ExecFailure>,
    pub ran: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub(crate) fn rooted() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            ..Default::default()
        })
    }

    pub(crate) fn unrooted() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.ran.lock().unwrap().clone()
    }
}

impl ShellChannel for RecordingShell {
    fn probe(&self) -> Probe {
        if self.available {
            Ok(())
        } else {
            Err(Unavailable::new(Channel::RootShell, "su denied"))
        }
    }

    fn run(&self, command: &str) -> Result<(), ExecFailure> {
        self.ran.lock().unwrap().push(command.to_owned());
        self.fail_with.clone().map_or(Ok(()), Err)
    }
}

/// Broker that is reachable and reports a fixed permission.
pub(crate) struct RecordingBroker {
    pub permission: BrokerPermission,
    pub exit_code: i32,
    pub ran: Mutex<Vec<Vec<String>>>,
}

impl RecordingBroker {
    pub(crate) fn new(permission: BrokerPermission) -> Arc<Self> {
        Arc::new(Self {
            permission,
            exit_code: 0,
            ran: Mutex::new(Vec::new()),
        })
    }
}

impl PrivilegeBroker for RecordingBroker {
    fn ping(&self) -> bool {
        true
    }

    fn permission(&self) -> BrokerPermission {
        self.permission
    }

    fn run_process(&self, argv: &[&str]) -> Result<i32, BrokerError> {
        self.ran
            .lock()
            .unwrap()
            .push(argv.iter().map(|s| (*s).to_owned()).collect());
        Ok(self.exit_code)
    }
}

/// Build a router over file-backed stores under `dir`.
pub(crate) fn file_router(
    dir: &Path,
    shell: Arc<dyn ShellChannel>,
    broker: Arc<dyn PrivilegeBroker>,
) -> Arc<CommandRouter> {
    build_router(
        HostCollaborators {
            slots: Arc::new(FileSlotStore::open(dir.join("slots.toml")).expect("open slot store")),
            trust: Arc::new(
                FileTrustStore::open(dir.join("bridge_trust.toml")).expect("open trust store"),
            ),
            accessibility: Arc::new(AccessibilityLink::new()),
            root_shell: shell,
            broker,
        },
        &HostConfig::default(),
    )
}

/// Bind tile `tile` in the slot file under `dir` before a router opens it.
pub(crate) fn seed_tile(dir: &Path, tile: i64, kind: ActionKind, value: &str) {
    let store = FileSlotStore::open(dir.join("slots.toml")).expect("open slot store");
    let slot = SlotId::tile(tile).expect("valid tile id");
    SlotPatch {
        label: Some(kind.label().to_owned()),
        action_kind: Some(kind),
        action_value: Some(value.to_owned()),
        ..Default::default()
    }
    .apply(&store, slot)
    .expect("seed slot");
}

/// Router over a fresh temp dir with no broker.
pub(crate) fn temp_router(
    shell: Arc<dyn ShellChannel>,
) -> (Arc<CommandRouter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let router = file_router(dir.path(), shell, Arc::new(NoBroker));
    (router, dir)
}

/// Route a command and unwrap the response.
pub(crate) fn call(
    router: &CommandRouter,
    command: CommandName,
    payload: serde_json::Value,
) -> ResponseEnvelope {
    route(router, command, payload).expect("route command")
}

pub(crate) fn route(
    router: &CommandRouter,
    command: CommandName,
    payload: serde_json::Value,
) -> Result<ResponseEnvelope, QuickSlotError> {
    router.route(&CommandEnvelope::new(
        uuid::Uuid::new_v4().to_string(),
        command,
        payload,
    ))
}

/// Drain all pending events from the broadcast receiver into a Vec.
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    while let Ok(evt) = rx.try_recv() {
        events.push(evt);
    }
    events
}
