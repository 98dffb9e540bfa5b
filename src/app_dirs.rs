//! Centralized filesystem paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Environment Overrides
//!
//! - `QUICKSLOT_DATA_DIR`: overrides [`data_dir`]
//! - `QUICKSLOT_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory (slot and trust state).
///
/// Resolves to `dirs::data_dir()/quickslot/` by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("QUICKSLOT_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("quickslot"))
        .unwrap_or_else(|| PathBuf::from("/tmp/quickslot-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/quickslot/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("QUICKSLOT_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("quickslot"))
        .unwrap_or_else(|| PathBuf::from("/tmp/quickslot-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Slot configuration file (`data_dir()/slots.toml`).
#[must_use]
pub fn slots_file() -> PathBuf {
    data_dir().join("slots.toml")
}

/// Bridge allow-list file (`data_dir()/bridge_trust.toml`).
#[must_use]
pub fn trust_file() -> PathBuf {
    data_dir().join("bridge_trust.toml")
}
