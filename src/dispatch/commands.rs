//! Shell command strings for shell-backed actions.

use crate::action::ActionKind;

/// Shell expression resolving to the foreground package when the shell runs it.
pub const FOREGROUND_PACKAGE_EXPR: &str = "$(dumpsys activity activities | grep mResumedActivity | cut -d '{' -f2 | cut -d '/' -f1 | cut -d ' ' -f3)";

/// Port used when enabling wireless debugging.
pub const ADB_TCP_PORT: u16 = 5555;

/// A command plus the message shown when it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevatedCommand {
    pub command: String,
    pub success_message: String,
}

impl ElevatedCommand {
    fn new(command: impl Into<String>, success_message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success_message: success_message.into(),
        }
    }
}

/// Shell fallback for accessibility-first actions.
#[must_use]
pub fn shell_fallback(kind: ActionKind) -> Option<&'static str> {
    match kind {
        ActionKind::Screenshot => Some("input keyevent 120"),
        ActionKind::LockScreen => Some("input keyevent 26"),
        ActionKind::PowerDialog => Some("input keyevent 26 --longpress"),
        _ => None,
    }
}

/// Build the command for an elevated-only action.
///
/// Returns `None` for kinds that are not shell-backed, or when a required
/// value is empty (shell command, clear data).
#[must_use]
pub fn elevated_command(kind: ActionKind, value: &str) -> Option<ElevatedCommand> {
    let value = value.trim();
    let enabled = value == "true";
    match kind {
        ActionKind::Reboot => Some(ElevatedCommand::new("reboot", "Rebooting...")),
        ActionKind::RebootRecovery => Some(ElevatedCommand::new(
            "reboot recovery",
            "Rebooting to Recovery...",
        )),
        ActionKind::ShellCommand => {
            (!value.is_empty()).then(|| ElevatedCommand::new(value, "Command executed"))
        }
        ActionKind::AdbWifi => {
            let port = if enabled {
                ADB_TCP_PORT.to_string()
            } else {
                "-1".to_owned()
            };
            let message = if enabled {
                "Wireless ADB Enabled"
            } else {
                "Wireless ADB Disabled"
            };
            Some(ElevatedCommand::new(
                format!("setprop service.adb.tcp.port {port} && stop adbd && start adbd"),
                message,
            ))
        }
        ActionKind::KillApp => {
            let package = if value.is_empty() {
                FOREGROUND_PACKAGE_EXPR
            } else {
                value
            };
            Some(ElevatedCommand::new(
                format!("am force-stop {package}"),
                "App killed",
            ))
        }
        ActionKind::ClearData => {
            if value.is_empty() {
                return None;
            }
            let package = value.split_once('/').map_or(value, |(pkg, _)| pkg);
            Some(ElevatedCommand::new(
                format!("pm clear {package}"),
                format!("Data cleared for {package}"),
            ))
        }
        ActionKind::MobileData => {
            let state = svc_state(enabled);
            Some(ElevatedCommand::new(
                format!("svc data {state}"),
                format!("Mobile Data {state}"),
            ))
        }
        ActionKind::Nfc => {
            let state = svc_state(enabled);
            Some(ElevatedCommand::new(
                format!("svc nfc {state}"),
                format!("NFC {state}"),
            ))
        }
        ActionKind::None
        | ActionKind::Toggle
        | ActionKind::OpenApp
        | ActionKind::OpenUrl
        | ActionKind::Flashlight
        | ActionKind::Screenshot
        | ActionKind::LockScreen
        | ActionKind::PowerDialog => None,
    }
}

fn svc_state(enabled: bool) -> &'static str {
    if enabled { "enable" } else { "disable" }
}
