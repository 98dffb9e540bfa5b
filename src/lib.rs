//! Quickslot: action dispatch and privilege arbitration for configurable
//! quick-action slots.
//!
//! A user binds up to twenty tile slots, plus an assistant slot, to device
//! operations. This crate decides which execution channel can carry out
//! each action and runs it there. It also gates slot changes requested by
//! external callers behind a persisted trust decision.
//!
//! # Architecture
//!
//! - **Privilege resolver** ([`privilege`]): probes accessibility, root shell
//!   and the brokered-privilege channel on every call
//! - **Command executor** ([`executor`]): broker first, then root shell, with
//!   a timeout and a structured outcome
//! - **Dispatch engine** ([`dispatch`]): per-action channel policy and user
//!   messages
//! - **Tile state manager** ([`tiles`]): per-slot toggle state under per-slot
//!   locks
//! - **Bridge trust gate** ([`bridge`]): approve/deny state machine for
//!   external requests
//! - **Host** ([`host`]): newline-delimited JSON protocol for a UI shell

pub mod action;
pub mod app_dirs;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod host;
pub mod privilege;
pub mod slots;
pub mod tiles;
pub mod trust;

#[cfg(test)]
pub(crate) mod test_utils;

pub use action::{Action, ActionKind, PrivilegeLevel};
pub use bridge::{BridgeOutcome, BridgeRequest, GateOutcome, PendingBridgeRequest, TrustGate};
pub use config::QuickSlotConfig;
pub use dispatch::{DispatchEngine, DispatchResult, Launcher, NavigationRequest, Platform};
pub use error::{QuickSlotError, Result};
pub use executor::{CommandExecutor, CommandOutcome, ExecFailure};
pub use privilege::{Channel, ChannelSet, PrivilegeResolver};
pub use slots::{Slot, SlotId, SlotStore};
pub use tiles::{TileState, TileStateManager};
pub use trust::TrustStore;
