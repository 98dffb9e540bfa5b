//! Action dispatch engine.
//!
//! Given an [`ActionKind`] and its value, pick the channel the action's
//! policy calls for, carry it out, and deliver at most one short message to
//! the user. Action families:
//!
//! - **Direct OS** (open app, open URL, flashlight): no privileged channel.
//! - **Accessibility-first** (screenshot, lock, power dialog): global action
//!   when accessibility is connected, shell key event otherwise.
//! - **Elevated-only** (reboot, shell command, toggles backed by `svc`, ...):
//!   always through the [`CommandExecutor`].
//!
//! Nothing here panics or returns an error; an unusable channel is a silent
//! no-op and a failed command becomes a terse message.

pub mod commands;
pub mod navigation;

use std::sync::Arc;

use serde::Serialize;

use crate::action::{ActionKind, PrivilegeLevel};
use crate::error::Result;
use crate::executor::{CommandExecutor, CommandOutcome, ExecFailure};
use crate::privilege::{AccessibilityLink, CapabilityStatus, GlobalAction, PrivilegeResolver};

pub use commands::{ElevatedCommand, FOREGROUND_PACKAGE_EXPR};
pub use navigation::{AppTarget, NavigationRequest, normalize_url};

/// Unprivileged platform operations the engine relies on.
pub trait Platform: Send + Sync {
    /// Open a navigation target directly.
    fn launch(&self, request: &NavigationRequest) -> Result<()>;

    /// Default launch component for `package`, or `None` if it has none.
    fn default_launch_target(&self, package: &str) -> Option<NavigationRequest>;

    /// Switch the hardware torch.
    fn set_torch(&self, enabled: bool) -> Result<()>;

    /// Show a short message directly (no accessibility hosting).
    fn show_message(&self, message: &str);

    /// Bring up the application's own main surface.
    fn open_main_surface(&self) -> Result<()> {
        Ok(())
    }
}

/// Performs navigation on behalf of a constrained calling surface.
///
/// A quick-settings tile, for example, must launch through its own
/// collapse-and-start call rather than a plain activity start.
pub trait Launcher {
    fn launch(&self, request: &NavigationRequest) -> Result<()>;
}

impl<F> Launcher for F
where
    F: Fn(&NavigationRequest) -> Result<()>,
{
    fn launch(&self, request: &NavigationRequest) -> Result<()> {
        self(request)
    }
}

/// What a dispatch did, as far as the caller needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    /// Message shown to the user. `None` means no visible feedback.
    pub message: Option<String>,
    /// Outcome of the privileged command, when one was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandOutcome>,
}

impl DispatchResult {
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            command: None,
        }
    }

    /// Message for a command outcome: the success text only on success.
    fn from_command(outcome: CommandOutcome, success_message: &str) -> Self {
        let message = match &outcome {
            CommandOutcome::Succeeded { .. } => Some(success_message.to_owned()),
            CommandOutcome::Failed {
                failure: ExecFailure::TimedOut(_),
                ..
            } => Some("Command timed out".to_owned()),
            CommandOutcome::Failed { .. } => Some("Command failed".to_owned()),
            CommandOutcome::Unavailable => None,
        };
        Self {
            message,
            command: Some(outcome),
        }
    }
}

/// Message shown after a shell fallback for an accessibility-first action.
pub const SHELL_FALLBACK_MESSAGE: &str = "Triggered via Shell";

/// Routes actions to channels.
pub struct DispatchEngine {
    resolver: Arc<PrivilegeResolver>,
    executor: CommandExecutor,
    accessibility: Arc<AccessibilityLink>,
    platform: Arc<dyn Platform>,
}

impl DispatchEngine {
    pub fn new(
        resolver: Arc<PrivilegeResolver>,
        accessibility: Arc<AccessibilityLink>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            executor: CommandExecutor::new(Arc::clone(&resolver)),
            resolver,
            accessibility,
            platform,
        }
    }

    pub fn resolver(&self) -> &PrivilegeResolver {
        &self.resolver
    }

    pub fn accessibility(&self) -> &AccessibilityLink {
        &self.accessibility
    }

    pub(crate) fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// Carry out `kind` with `value` and show the resulting message.
    ///
    /// Blocks while a privileged command runs.
    pub fn dispatch(
        &self,
        kind: ActionKind,
        value: &str,
        launcher: Option<&dyn Launcher>,
    ) -> DispatchResult {
        let result = self.execute(kind, value, launcher);
        tracing::debug!(
            action = %kind,
            required = ?kind.descriptor().required_privilege,
            message = ?result.message,
            "action dispatched"
        );
        if let Some(message) = &result.message {
            self.notify(message);
        }
        result
    }

    /// Deliver a message, hosted by accessibility when it is connected.
    pub fn notify(&self, message: &str) {
        match self.accessibility.service() {
            Some(service) => service.show_message(message),
            None => self.platform.show_message(message),
        }
    }

    fn execute(
        &self,
        kind: ActionKind,
        value: &str,
        launcher: Option<&dyn Launcher>,
    ) -> DispatchResult {
        match kind {
            ActionKind::None | ActionKind::Toggle => DispatchResult::silent(),
            ActionKind::OpenApp => self.open_app(value, launcher),
            ActionKind::OpenUrl => self.open_url(value, launcher),
            ActionKind::Flashlight => self.flashlight(value),
            ActionKind::Screenshot => self.global_action(kind, GlobalAction::TakeScreenshot),
            ActionKind::LockScreen => self.global_action(kind, GlobalAction::LockScreen),
            ActionKind::PowerDialog => self.global_action(kind, GlobalAction::PowerDialog),
            ActionKind::Reboot
            | ActionKind::RebootRecovery
            | ActionKind::ShellCommand
            | ActionKind::AdbWifi
            | ActionKind::KillApp
            | ActionKind::ClearData
            | ActionKind::MobileData
            | ActionKind::Nfc => self.elevated(kind, value),
        }
    }

    fn open_app(&self, value: &str, launcher: Option<&dyn Launcher>) -> DispatchResult {
        let request = match AppTarget::parse(value) {
            None => return DispatchResult::silent(),
            Some(AppTarget::Component { package, class }) => {
                NavigationRequest::Component { package, class }
            }
            Some(AppTarget::Package(package)) => {
                match self.platform.default_launch_target(&package) {
                    Some(request) => request,
                    None => {
                        tracing::warn!(%package, "no launch target for package");
                        return DispatchResult::silent();
                    }
                }
            }
        };
        self.navigate(&request, launcher, "Opening app...")
    }

    fn open_url(&self, value: &str, launcher: Option<&dyn Launcher>) -> DispatchResult {
        match normalize_url(value) {
            Some(url) => self.navigate(&NavigationRequest::ViewUrl { url }, launcher, "Opening URL..."),
            None => DispatchResult::silent(),
        }
    }

    fn navigate(
        &self,
        request: &NavigationRequest,
        launcher: Option<&dyn Launcher>,
        success_message: &str,
    ) -> DispatchResult {
        let launched = match launcher {
            Some(launcher) => launcher.launch(request),
            None => self.platform.launch(request),
        };
        match launched {
            Ok(()) => DispatchResult::message(success_message),
            Err(e) => {
                tracing::warn!(?request, error = %e, "navigation failed");
                DispatchResult::silent()
            }
        }
    }

    fn flashlight(&self, value: &str) -> DispatchResult {
        let enabled = value.trim() == "true";
        match self.platform.set_torch(enabled) {
            Ok(()) => DispatchResult::message(if enabled {
                "Flashlight On"
            } else {
                "Flashlight Off"
            }),
            Err(e) => {
                tracing::warn!(enabled, error = %e, "torch control failed");
                DispatchResult::silent()
            }
        }
    }

    fn global_action(&self, kind: ActionKind, action: GlobalAction) -> DispatchResult {
        debug_assert_eq!(
            kind.descriptor().required_privilege,
            PrivilegeLevel::Accessibility
        );
        if self.resolver.probe_accessibility().is_ok() {
            if let Some(service) = self.accessibility.service() {
                if !service.perform_global_action(action) {
                    tracing::warn!(?action, "accessibility refused global action");
                }
                // The system UI reacting is the feedback.
                return DispatchResult::silent();
            }
        }

        let Some(command) = commands::shell_fallback(kind) else {
            return DispatchResult::silent();
        };
        DispatchResult::from_command(self.executor.run(command), SHELL_FALLBACK_MESSAGE)
    }

    fn elevated(&self, kind: ActionKind, value: &str) -> DispatchResult {
        debug_assert_eq!(kind.descriptor().required_privilege, PrivilegeLevel::Elevated);
        match commands::elevated_command(kind, value) {
            Some(cmd) => {
                DispatchResult::from_command(self.executor.run(&cmd.command), &cmd.success_message)
            }
            None => DispatchResult::silent(),
        }
    }

    /// Whether the accessibility link currently reports connected.
    #[must_use]
    pub fn accessibility_connected(&self) -> bool {
        self.accessibility.is_connected()
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("accessibility", &self.accessibility)
            .finish_non_exhaustive()
    }
}
