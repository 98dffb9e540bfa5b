//! Slot configuration access.
//!
//! Slots are owned by an opaque key/value [`SlotStore`]. The core reads a
//! slot fresh on every dispatch through [`read_slot`] and writes individual
//! fields; it never holds a [`Slot`] across calls. Missing fields read as
//! defaults, so a slot exists as soon as it is first read.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::error::{QuickSlotError, Result};

/// Number of numbered tile slots.
pub const MAX_TILE_ID: u8 = 20;

/// Wire id of the assistant sentinel slot.
pub const ASSISTANT_WIRE_ID: i64 = -1;

/// Identifies a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    /// Numbered tile, `1..=20`.
    Tile(u8),
    /// The assistant gesture slot.
    Assistant,
}

impl SlotId {
    /// A numbered tile, if `id` is within `1..=20`.
    #[must_use]
    pub fn tile(id: i64) -> Option<Self> {
        u8::try_from(id)
            .ok()
            .filter(|id| (1..=MAX_TILE_ID).contains(id))
            .map(Self::Tile)
    }

    /// A tile id or the assistant sentinel.
    #[must_use]
    pub fn from_wire(id: i64) -> Option<Self> {
        if id == ASSISTANT_WIRE_ID {
            Some(Self::Assistant)
        } else {
            Self::tile(id)
        }
    }

    #[must_use]
    pub fn wire_id(self) -> i64 {
        match self {
            Self::Tile(id) => i64::from(id),
            Self::Assistant => ASSISTANT_WIRE_ID,
        }
    }

    /// All numbered tile slots.
    pub fn tiles() -> impl Iterator<Item = SlotId> {
        (1..=MAX_TILE_ID).map(Self::Tile)
    }

    fn key_prefix(self) -> String {
        match self {
            Self::Tile(id) => format!("tile_{id}"),
            Self::Assistant => "assistant".to_owned(),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tile(id) => write!(f, "tile #{id}"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A stored slot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotField {
    Label,
    Subtitle,
    ActionType,
    ActionValue,
    IconType,
    IconValue,
    IsActive,
    UseAnimation,
}

impl SlotField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Subtitle => "subtitle",
            Self::ActionType => "action_type",
            Self::ActionValue => "action_value",
            Self::IconType => "icon_type",
            Self::IconValue => "icon_value",
            Self::IsActive => "is_active",
            Self::UseAnimation => "use_animation",
        }
    }

    /// Store key for this field of `slot`, e.g. `tile_3_label`.
    #[must_use]
    pub fn key(self, slot: SlotId) -> String {
        format!("{}_{}", slot.key_prefix(), self.as_str())
    }
}

/// A stored value: text or flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Narrow key/value interface to slot persistence.
pub trait SlotStore: Send + Sync {
    fn get_field(&self, slot: SlotId, field: SlotField) -> Result<Option<FieldValue>>;
    fn set_field(&self, slot: SlotId, field: SlotField, value: FieldValue) -> Result<()>;
}

/// Where a slot's icon comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IconSpec {
    /// The action kind's built-in icon.
    Default,
    /// A named built-in icon.
    Builtin(String),
    /// An image picked by the user (content URI).
    Gallery(String),
}

impl IconSpec {
    fn from_parts(kind: &str, value: String) -> Self {
        match kind {
            "BUILTIN" => Self::Builtin(value),
            "GALLERY" => Self::Gallery(value),
            _ => Self::Default,
        }
    }

    fn parts(&self) -> (&'static str, &str) {
        match self {
            Self::Default => ("DEFAULT", ""),
            Self::Builtin(name) => ("BUILTIN", name),
            Self::Gallery(uri) => ("GALLERY", uri),
        }
    }
}

/// Snapshot of one slot's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub label: String,
    pub subtitle: String,
    pub action_kind: ActionKind,
    pub action_value: String,
    pub icon: IconSpec,
    pub is_active: bool,
    pub use_animation: bool,
}

impl Slot {
    /// Configuration of a slot that was never written.
    #[must_use]
    pub fn defaults(slot: SlotId) -> Self {
        Self {
            label: match slot {
                SlotId::Tile(id) => format!("Tile {id}"),
                SlotId::Assistant => "Assistant".to_owned(),
            },
            subtitle: String::new(),
            action_kind: ActionKind::None,
            action_value: String::new(),
            icon: IconSpec::Default,
            is_active: false,
            use_animation: true,
        }
    }
}

/// Read the current configuration of `slot`, filling defaults.
///
/// An unknown stored action type reads as [`ActionKind::None`].
pub fn read_slot(store: &dyn SlotStore, slot: SlotId) -> Result<Slot> {
    let defaults = Slot::defaults(slot);
    let text = |field: SlotField, default: String| -> Result<String> {
        Ok(store
            .get_field(slot, field)?
            .and_then(FieldValue::into_text)
            .unwrap_or(default))
    };
    let flag = |field: SlotField, default: bool| -> Result<bool> {
        Ok(store
            .get_field(slot, field)?
            .and_then(|v| v.as_flag())
            .unwrap_or(default))
    };

    let raw_kind = text(SlotField::ActionType, ActionKind::None.as_str().to_owned())?;
    let action_kind = raw_kind.parse().unwrap_or_else(|e| {
        tracing::warn!(%slot, error = %e, "stored action type not recognised");
        ActionKind::None
    });
    let icon_type = text(SlotField::IconType, "DEFAULT".to_owned())?;
    let icon_value = text(SlotField::IconValue, String::new())?;

    Ok(Slot {
        label: text(SlotField::Label, defaults.label)?,
        subtitle: text(SlotField::Subtitle, defaults.subtitle)?,
        action_kind,
        action_value: text(SlotField::ActionValue, defaults.action_value)?,
        icon: IconSpec::from_parts(&icon_type, icon_value),
        is_active: flag(SlotField::IsActive, defaults.is_active)?,
        use_animation: flag(SlotField::UseAnimation, defaults.use_animation)?,
    })
}

/// A partial slot update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_kind: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSpec>,
}

impl SlotPatch {
    /// Write every present field to `slot`.
    pub fn apply(&self, store: &dyn SlotStore, slot: SlotId) -> Result<()> {
        if let Some(label) = &self.label {
            store.set_field(slot, SlotField::Label, label.as_str().into())?;
        }
        if let Some(subtitle) = &self.subtitle {
            store.set_field(slot, SlotField::Subtitle, subtitle.as_str().into())?;
        }
        if let Some(kind) = self.action_kind {
            store.set_field(slot, SlotField::ActionType, kind.as_str().into())?;
        }
        if let Some(value) = &self.action_value {
            store.set_field(slot, SlotField::ActionValue, value.as_str().into())?;
        }
        if let Some(icon) = &self.icon {
            let (kind, value) = icon.parts();
            store.set_field(slot, SlotField::IconType, kind.into())?;
            store.set_field(slot, SlotField::IconValue, value.into())?;
        }
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    fields: Mutex<BTreeMap<String, FieldValue>>,
}

impl MemorySlotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn get_field(&self, slot: SlotId, field: SlotField) -> Result<Option<FieldValue>> {
        let fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        Ok(fields.get(&field.key(slot)).cloned())
    }

    fn set_field(&self, slot: SlotId, field: SlotField, value: FieldValue) -> Result<()> {
        self.fields
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(field.key(slot), value);
        Ok(())
    }
}

/// TOML-file store. Every write rewrites the file.
#[derive(Debug)]
pub struct FileSlotStore {
    path: PathBuf,
    fields: Mutex<BTreeMap<String, FieldValue>>,
}

impl FileSlotStore {
    /// Open `path`, starting empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let fields = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                QuickSlotError::SlotStore(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            fields: Mutex::new(fields),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, fields: &BTreeMap<String, FieldValue>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(fields)
            .map_err(|e| QuickSlotError::SlotStore(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SlotStore for FileSlotStore {
    fn get_field(&self, slot: SlotId, field: SlotField) -> Result<Option<FieldValue>> {
        let fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        Ok(fields.get(&field.key(slot)).cloned())
    }

    fn set_field(&self, slot: SlotId, field: SlotField, value: FieldValue) -> Result<()> {
        let mut fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = fields.clone();
        next.insert(field.key(slot), value);
        self.persist(&next)?;
        *fields = next;
        Ok(())
    }
}
