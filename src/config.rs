//! Configuration types for the dispatch engine and host bridge.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickSlotConfig {
    /// Privileged command execution settings.
    pub executor: ExecutorConfig,
    /// Channel availability probe settings.
    pub probe: ProbeConfig,
    /// Host bridge channel settings.
    pub host: HostConfig,
    /// Where slot and trust state is persisted.
    pub storage: StorageConfig,
}

/// Privileged command execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Superuser binary spawned for the root shell channel.
    pub su_binary: String,
    /// Upper bound on a single privileged command, in seconds.
    ///
    /// A command still running at the deadline is killed and reported as
    /// timed out.
    pub command_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            su_binary: "su".to_owned(),
            command_timeout_secs: 30,
        }
    }
}

impl ExecutorConfig {
    /// Command timeout as a [`Duration`].
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

/// Channel availability probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Root shell probe timeout in milliseconds.
    ///
    /// Probes run on every dispatch, so this stays well below the command
    /// timeout. A superuser prompt that outlives it counts as unavailable.
    pub root_probe_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            root_probe_timeout_ms: 3_000,
        }
    }
}

impl ProbeConfig {
    /// Root probe timeout as a [`Duration`].
    #[must_use]
    pub fn root_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.root_probe_timeout_ms.max(1))
    }
}

/// Host bridge channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Bounded request queue between the stdio reader and the router.
    pub request_capacity: usize,
    /// Broadcast buffer for outbound events.
    pub event_capacity: usize,
    /// Seconds an undecided bridge request waits before it is discarded.
    pub approval_ttl_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            request_capacity: 64,
            event_capacity: 128,
            approval_ttl_secs: 300,
        }
    }
}

impl HostConfig {
    /// Approval lifetime as a [`Duration`].
    #[must_use]
    pub fn approval_ttl(&self) -> Duration {
        Duration::from_secs(self.approval_ttl_secs.max(1))
    }
}

/// Persistence locations. `None` resolves under [`crate::app_dirs::data_dir`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub slots_file: Option<PathBuf>,
    pub trust_file: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved slot store path.
    #[must_use]
    pub fn slots_path(&self) -> PathBuf {
        self.slots_file
            .clone()
            .unwrap_or_else(crate::app_dirs::slots_file)
    }

    /// Resolved trust store path.
    #[must_use]
    pub fn trust_path(&self) -> PathBuf {
        self.trust_file
            .clone()
            .unwrap_or_else(crate::app_dirs::trust_file)
    }
}

impl QuickSlotConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::QuickSlotError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::QuickSlotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (`config_dir()/config.toml`).
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// Load from the default path, or defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default() -> crate::error::Result<Self> {
        let path = Self::default_config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}
