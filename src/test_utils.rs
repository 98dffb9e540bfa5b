//! Shared fakes for unit tests across `tiles`, `bridge`, and `host`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};

use crate::dispatch::{DispatchEngine, NavigationRequest, Platform};
use crate::error::{QuickSlotError, Result};
use crate::executor::ExecFailure;
use crate::privilege::{
    AccessibilityLink, AccessibilityService, BrokerError, BrokerPermission, Channel, GlobalAction,
    PrivilegeBroker, PrivilegeResolver, Probe, ShellChannel, Unavailable,
};
use crate::slots::MemorySlotStore;
use crate::tiles::TileStateManager;

#[derive(Default)]
pub struct RecordingPlatform {
    pub launched: Mutex<Vec<NavigationRequest>>,
    pub torch: Mutex<Vec<bool>>,
    pub messages: Mutex<Vec<String>>,
    pub main_surface_opens: Mutex<usize>,
    pub torch_broken: bool,
}

impl Platform for RecordingPlatform {
    fn launch(&self, request: &NavigationRequest) -> Result<()> {
        self.launched.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn default_launch_target(&self, package: &str) -> Option<NavigationRequest> {
        Some(NavigationRequest::Component {
            package: package.to_owned(),
            class: format!("{package}.MainActivity"),
        })
    }

    fn set_torch(&self, enabled: bool) -> Result<()> {
        if self.torch_broken {
            return Err(QuickSlotError::Platform("no camera".to_owned()));
        }
        self.torch.lock().unwrap().push(enabled);
        Ok(())
    }

    fn show_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }

    fn open_main_surface(&self) -> Result<()> {
        *self.main_surface_opens.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAccessibility {
    pub actions: Mutex<Vec<GlobalAction>>,
    pub messages: Mutex<Vec<String>>,
}

impl AccessibilityService for RecordingAccessibility {
    fn perform_global_action(&self, action: GlobalAction) -> bool {
        self.actions.lock().unwrap().push(action);
        true
    }

    fn show_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}

/// Root shell stand-in that records commands instead of running them.
#[derive(Default)]
pub struct ScriptedShell {
    pub available: bool,
    pub fail_with: Option<ExecFailure>,
    pub ran: Mutex<Vec<String>>,
    pub gate: Option<ShellGate>,
}

/// Parks the first command a [`ScriptedShell`] runs until released.
pub struct ShellGate {
    entered: mpsc::Sender<()>,
    release: Mutex<mpsc::Receiver<()>>,
    used: AtomicBool,
}

impl ShellGate {
    /// Returns the gate, a receiver signalled when the first command is
    /// parked, and the sender that releases it.
    pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Self {
            entered: entered_tx,
            release: Mutex::new(release_rx),
            used: AtomicBool::new(false),
        };
        (gate, entered_rx, release_tx)
    }

    fn hold(&self) {
        if self.used.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.entered.send(());
        let _ = self.release.lock().unwrap().recv();
    }
}

impl ScriptedShell {
    pub fn rooted() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }
}

impl ShellChannel for ScriptedShell {
    fn probe(&self) -> Probe {
        if self.available {
            Ok(())
        } else {
            Err(Unavailable::new(Channel::RootShell, "no su"))
        }
    }

    fn run(&self, command: &str) -> std::result::Result<(), ExecFailure> {
        self.ran.lock().unwrap().push(command.to_owned());
        if let Some(gate) = &self.gate {
            gate.hold();
        }
        self.fail_with.clone().map_or(Ok(()), Err)
    }
}

pub struct DeadBroker;

impl PrivilegeBroker for DeadBroker {
    fn ping(&self) -> bool {
        false
    }

    fn permission(&self) -> BrokerPermission {
        BrokerPermission::Denied
    }

    fn run_process(&self, _argv: &[&str]) -> std::result::Result<i32, BrokerError> {
        Err(BrokerError::NotReachable("dead".to_owned()))
    }
}

/// A tile manager over in-memory slots with handles to every fake.
pub struct Rig {
    pub tiles: Arc<TileStateManager>,
    pub store: Arc<MemorySlotStore>,
    pub platform: Arc<RecordingPlatform>,
    pub shell: Arc<ScriptedShell>,
    pub link: Arc<AccessibilityLink>,
}

pub fn rig(shell: ScriptedShell) -> Rig {
    let link = Arc::new(AccessibilityLink::new());
    let shell = Arc::new(shell);
    let platform = Arc::new(RecordingPlatform::default());
    let store = Arc::new(MemorySlotStore::new());
    let resolver = Arc::new(PrivilegeResolver::new(
        link.clone(),
        shell.clone(),
        Arc::new(DeadBroker),
    ));
    let engine = Arc::new(DispatchEngine::new(resolver, link.clone(), platform.clone()));
    let tiles = Arc::new(TileStateManager::new(store.clone(), engine));
    Rig {
        tiles,
        store,
        platform,
        shell,
        link,
    }
}
