//! Action registry: the closed set of things a slot can be bound to.
//!
//! Each [`ActionKind`] maps to an immutable [`Action`] descriptor stating the
//! privilege it needs and whether it is a toggle. How an action is carried
//! out lives in [`crate::dispatch`]; this module only says *what* it is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a slot action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Unbound slot.
    None,
    /// Plain on/off flag with no side effect.
    Toggle,
    /// Launch an application or a specific component.
    OpenApp,
    /// Open a web page.
    OpenUrl,
    /// Hardware torch.
    Flashlight,
    Screenshot,
    LockScreen,
    PowerDialog,
    Reboot,
    RebootRecovery,
    /// Arbitrary privileged shell command taken from the slot value.
    ShellCommand,
    /// Wireless debugging (adb over tcp).
    AdbWifi,
    /// Force-stop a package, or the foreground app when no package is set.
    KillApp,
    ClearData,
    MobileData,
    Nfc,
}

/// Ordered privilege requirement of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    /// Runs as an ordinary app (launches, torch).
    None,
    /// Prefers accessibility automation, may fall back to a shell.
    Accessibility,
    /// Requires a root shell or the brokered-privilege channel.
    Elevated,
}

/// Immutable descriptor for an action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub id: ActionKind,
    pub required_privilege: PrivilegeLevel,
    pub is_toggle: bool,
}

impl ActionKind {
    /// Return all action variants in menu order.
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::None,
            ActionKind::Toggle,
            ActionKind::Flashlight,
            ActionKind::OpenApp,
            ActionKind::OpenUrl,
            ActionKind::Screenshot,
            ActionKind::LockScreen,
            ActionKind::PowerDialog,
            ActionKind::Reboot,
            ActionKind::RebootRecovery,
            ActionKind::ShellCommand,
            ActionKind::AdbWifi,
            ActionKind::KillApp,
            ActionKind::ClearData,
            ActionKind::MobileData,
            ActionKind::Nfc,
        ]
    }

    /// Descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> Action {
        let (required_privilege, is_toggle) = match self {
            Self::None | Self::Toggle => (PrivilegeLevel::None, self == Self::Toggle),
            Self::OpenApp | Self::OpenUrl => (PrivilegeLevel::None, false),
            Self::Flashlight => (PrivilegeLevel::None, true),
            Self::Screenshot | Self::LockScreen | Self::PowerDialog => {
                (PrivilegeLevel::Accessibility, false)
            }
            Self::Reboot
            | Self::RebootRecovery
            | Self::ShellCommand
            | Self::KillApp
            | Self::ClearData => (PrivilegeLevel::Elevated, false),
            Self::AdbWifi | Self::MobileData | Self::Nfc => (PrivilegeLevel::Elevated, true),
        };
        Action {
            id: self,
            required_privilege,
            is_toggle,
        }
    }

    /// Whether invoking this kind flips the slot's active flag.
    #[must_use]
    pub fn is_toggle(self) -> bool {
        self.descriptor().is_toggle
    }

    /// Wire identifier, as stored in slot configuration and bridge requests.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Toggle => "TOGGLE",
            Self::OpenApp => "OPEN_APP",
            Self::OpenUrl => "OPEN_URL",
            Self::Flashlight => "FLASHLIGHT",
            Self::Screenshot => "SCREENSHOT",
            Self::LockScreen => "LOCK_SCREEN",
            Self::PowerDialog => "POWER_DIALOG",
            Self::Reboot => "REBOOT",
            Self::RebootRecovery => "REBOOT_RECOVERY",
            Self::ShellCommand => "SHELL_COMMAND",
            Self::AdbWifi => "ADB_WIFI",
            Self::KillApp => "KILL_APP",
            Self::ClearData => "CLEAR_DATA",
            Self::MobileData => "MOBILE_DATA",
            Self::Nfc => "NFC",
        }
    }

    /// Human-readable menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Toggle => "Simple Toggle",
            Self::Flashlight => "Flashlight / Torch",
            Self::OpenApp => "Open App / Activity",
            Self::OpenUrl => "Open Web Page",
            Self::Screenshot => "Take Screenshot",
            Self::LockScreen => "Lock Screen",
            Self::PowerDialog => "Power Menu",
            Self::Reboot => "Reboot",
            Self::RebootRecovery => "Reboot to Recovery",
            Self::ShellCommand => "Run Shell Command",
            Self::AdbWifi => "Wireless ADB (Toggle)",
            Self::KillApp => "Kill Foreground/Specific App",
            Self::ClearData => "Clear App Data",
            Self::MobileData => "Mobile Data (Toggle)",
            Self::Nfc => "NFC (Toggle)",
        }
    }

    /// Built-in icon name shown when a slot has no custom icon.
    #[must_use]
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::Flashlight => "ic_flashlight",
            Self::Screenshot => "ic_screenshot",
            Self::AdbWifi => "ic_wifi",
            Self::Reboot => "ic_reboot",
            Self::RebootRecovery => "ic_rocket",
            Self::PowerDialog => "ic_power",
            Self::LockScreen => "ic_bolt",
            Self::ShellCommand | Self::MobileData => "ic_speed",
            Self::Nfc => "ic_star",
            Self::Toggle => "ic_gamepad",
            Self::None
            | Self::OpenApp
            | Self::OpenUrl
            | Self::KillApp
            | Self::ClearData => FALLBACK_ICON,
        }
    }
}

/// Icon used when nothing more specific applies.
pub const FALLBACK_ICON: &str = "ic_launcher_foreground";

/// Built-in icon names a slot may select explicitly.
pub const BUILTIN_ICONS: &[&str] = &[
    "ic_flashlight",
    "ic_screenshot",
    "ic_wifi",
    "ic_reboot",
    "ic_rocket",
    "ic_power",
    "ic_bolt",
    "ic_speed",
    "ic_star",
    "ic_gamepad",
    FALLBACK_ICON,
];

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ActionParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ActionParseError(s.to_owned()))
    }
}

/// Error returned when parsing an unknown action identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError(pub String);

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action kind: {:?}", self.0)
    }
}

impl std::error::Error for ActionParseError {}
