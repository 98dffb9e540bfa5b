//! Allow-list of external callers trusted to reconfigure slots.
//!
//! Absence of an entry means "not allowed". Callers are identified by an
//! opaque string (usually a package name) and compared exactly.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuickSlotError, Result};

/// Persistence interface for trust decisions.
pub trait TrustStore: Send + Sync {
    fn is_allowed(&self, caller: &str) -> bool;
    fn set_allowed(&self, caller: &str, allowed: bool) -> Result<()>;
    /// Callers currently allowed, each listed once.
    fn list_allowed(&self) -> Vec<String>;
}

/// A single trust decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEntry {
    pub caller: String,
    pub allowed: bool,
    /// When the decision was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-memory list of trust entries, one per caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustList {
    #[serde(default)]
    entries: Vec<TrustEntry>,
}

impl TrustList {
    pub fn entries(&self) -> &[TrustEntry] {
        &self.entries
    }

    pub fn is_allowed(&self, caller: &str) -> bool {
        self.entries
            .iter()
            .find(|e| e.caller == caller)
            .is_some_and(|e| e.allowed)
    }

    /// Record a decision, updating an existing entry in place.
    pub fn set(&mut self, caller: &str, allowed: bool) {
        let now = Some(Utc::now());
        if let Some(existing) = self.entries.iter_mut().find(|e| e.caller == caller) {
            existing.allowed = allowed;
            existing.updated_at = now;
        } else {
            self.entries.push(TrustEntry {
                caller: caller.to_owned(),
                allowed,
                updated_at: now,
            });
        }
    }

    pub fn allowed(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.allowed)
            .map(|e| e.caller.clone())
            .collect()
    }
}

/// Trust store that lives for the process only.
#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    list: Mutex<TrustList>,
}

impl MemoryTrustStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for MemoryTrustStore {
    fn is_allowed(&self, caller: &str) -> bool {
        self.list
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_allowed(caller)
    }

    fn set_allowed(&self, caller: &str, allowed: bool) -> Result<()> {
        self.list
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set(caller, allowed);
        Ok(())
    }

    fn list_allowed(&self) -> Vec<String> {
        self.list
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .allowed()
    }
}

/// Trust store persisted as TOML (`[[entries]]` tables).
#[derive(Debug)]
pub struct FileTrustStore {
    path: PathBuf,
    list: Mutex<TrustList>,
}

impl FileTrustStore {
    /// Open `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let list = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                QuickSlotError::TrustStore(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            TrustList::default()
        };
        Ok(Self {
            path,
            list: Mutex::new(list),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, list: &TrustList) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(list).map_err(|e| QuickSlotError::TrustStore(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TrustStore for FileTrustStore {
    fn is_allowed(&self, caller: &str) -> bool {
        self.list
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_allowed(caller)
    }

    fn set_allowed(&self, caller: &str, allowed: bool) -> Result<()> {
        let mut list = self.list.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = list.clone();
        next.set(caller, allowed);
        self.persist(&next)?;
        *list = next;
        tracing::debug!(caller, allowed, path = %self.path.display(), "trust entry saved");
        Ok(())
    }

    fn list_allowed(&self) -> Vec<String> {
        self.list
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .allowed()
    }
}
