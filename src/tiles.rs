//! Tile state manager.
//!
//! Owns the per-slot "active" flag used by toggle actions. Each trigger
//! re-reads the slot, so configuration changes apply on the next tap without
//! any cache invalidation. Flips of one slot are serialized through a per-slot
//! lock; different slots never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::action::{ActionKind, BUILTIN_ICONS, FALLBACK_ICON};
use crate::dispatch::{DispatchEngine, DispatchResult, Launcher};
use crate::error::Result;
use crate::slots::{FieldValue, IconSpec, Slot, SlotField, SlotId, SlotStore, read_slot};

/// Hint shown when the assistant is bound to screenshot without accessibility.
pub const ASSISTANT_SCREENSHOT_HINT: &str =
    "Please enable Accessibility Service for Screenshot fallback.";

/// Receives "this tile changed, redraw it" requests.
pub trait TileRefresher: Send + Sync {
    fn request_refresh(&self, slot: SlotId);
}

/// Display state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    /// Nothing bound.
    Unavailable,
    Active,
    Inactive,
}

/// Icon after resolving defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResolvedIcon {
    Builtin(String),
    Gallery(String),
}

/// Everything a UI needs to draw one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileView {
    pub slot: i64,
    pub label: String,
    pub subtitle: String,
    pub icon: ResolvedIcon,
    pub state: TileState,
    pub use_animation: bool,
}

/// Whether `kind` keeps an on/off flag that flips on every trigger.
#[must_use]
pub fn is_toggle_kind(kind: ActionKind) -> bool {
    kind.is_toggle()
}

fn resolve_icon(slot: &Slot) -> ResolvedIcon {
    match &slot.icon {
        IconSpec::Gallery(uri) => ResolvedIcon::Gallery(uri.clone()),
        IconSpec::Builtin(name) if BUILTIN_ICONS.contains(&name.as_str()) => {
            ResolvedIcon::Builtin(name.clone())
        }
        IconSpec::Builtin(name) => {
            tracing::debug!(icon = %name, "unknown built-in icon; using fallback");
            ResolvedIcon::Builtin(FALLBACK_ICON.to_owned())
        }
        IconSpec::Default => ResolvedIcon::Builtin(slot.action_kind.default_icon().to_owned()),
    }
}

/// Flip, trigger and describe slots.
pub struct TileStateManager {
    store: Arc<dyn SlotStore>,
    engine: Arc<DispatchEngine>,
    refresher: Option<Arc<dyn TileRefresher>>,
    locks: Mutex<HashMap<SlotId, Arc<Mutex<()>>>>,
}

impl TileStateManager {
    pub fn new(store: Arc<dyn SlotStore>, engine: Arc<DispatchEngine>) -> Self {
        Self {
            store,
            engine,
            refresher: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Route refresh requests to `refresher`.
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn TileRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn store(&self) -> &dyn SlotStore {
        self.store.as_ref()
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Read a slot's current configuration.
    pub fn slot(&self, slot: SlotId) -> Result<Slot> {
        read_slot(self.store.as_ref(), slot)
    }

    /// Ask the UI to redraw `slot`. A no-op without a refresher.
    pub fn request_refresh(&self, slot: SlotId) {
        if let Some(refresher) = &self.refresher {
            refresher.request_refresh(slot);
        }
    }

    fn slot_lock(&self, slot: SlotId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(slot).or_default())
    }

    /// Invert the slot's active flag and return the new value.
    pub fn flip(&self, slot: SlotId) -> Result<bool> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.flip_locked(slot)
    }

    /// Caller holds the slot's lock.
    fn flip_locked(&self, slot: SlotId) -> Result<bool> {
        let next = !self.slot(slot)?.is_active;
        self.store
            .set_field(slot, SlotField::IsActive, FieldValue::Flag(next))?;
        tracing::debug!(%slot, active = next, "tile flipped");
        Ok(next)
    }

    /// Run the action bound to `slot`.
    ///
    /// Toggle kinds flip first and dispatch the new state as `"true"` or
    /// `"false"`; other kinds dispatch the stored value. The slot's lock is
    /// held until dispatch returns, so commands on one slot run in flip
    /// order and the last command always matches the stored flag.
    pub fn trigger(&self, slot: SlotId, launcher: Option<&dyn Launcher>) -> Result<DispatchResult> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let config = self.slot(slot)?;
        let kind = config.action_kind;
        if kind == ActionKind::None {
            return Ok(DispatchResult::silent());
        }

        let value = if is_toggle_kind(kind) {
            let state = self.flip_locked(slot)?;
            self.request_refresh(slot);
            state.to_string()
        } else {
            config.action_value
        };
        Ok(self.engine.dispatch(kind, &value, launcher))
    }

    /// Run the action bound to the assistant gesture.
    pub fn trigger_assistant(&self) -> Result<DispatchResult> {
        let config = self.slot(SlotId::Assistant)?;
        match config.action_kind {
            ActionKind::None => {
                if let Err(e) = self.engine.platform().open_main_surface() {
                    tracing::warn!(error = %e, "could not open main surface");
                }
                Ok(DispatchResult::silent())
            }
            ActionKind::Screenshot if !self.engine.accessibility_connected() => {
                self.engine.notify(ASSISTANT_SCREENSHOT_HINT);
                Ok(DispatchResult {
                    message: Some(ASSISTANT_SCREENSHOT_HINT.to_owned()),
                    command: None,
                })
            }
            kind => Ok(self.engine.dispatch(kind, &config.action_value, None)),
        }
    }

    /// Display state derived from the slot's kind and flag.
    pub fn tile_state(&self, slot: SlotId) -> Result<TileState> {
        Ok(state_of(&self.slot(slot)?))
    }

    pub fn tile_view(&self, slot: SlotId) -> Result<TileView> {
        let config = self.slot(slot)?;
        Ok(TileView {
            slot: slot.wire_id(),
            state: state_of(&config),
            icon: resolve_icon(&config),
            label: config.label,
            subtitle: config.subtitle,
            use_animation: config.use_animation,
        })
    }
}

fn state_of(slot: &Slot) -> TileState {
    match slot.action_kind {
        ActionKind::None => TileState::Unavailable,
        kind if is_toggle_kind(kind) => {
            if slot.is_active {
                TileState::Active
            } else {
                TileState::Inactive
            }
        }
        _ => TileState::Inactive,
    }
}

impl std::fmt::Debug for TileStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStateManager")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
