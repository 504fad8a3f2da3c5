//! Taleweaver domain library.
//!
//! Core domain types and invariants for the turn-based reconciliation engine:
//!
//! - `world_state` - Canonical mutable game state and its serialization
//! - `update_set` - The field-keyed delta extracted from a turn
//! - `monitor` - Per-field reducers and the dispatch registry
//! - `history` - Append-only turn log
//! - `error` - Validation errors and non-fatal dispatch warnings
//!
//! This crate is pure: no async, no I/O, no clocks beyond timestamping.

pub mod error;
pub mod history;
pub mod monitor;
pub mod update_set;
pub mod world_state;

pub use error::{DispatchWarning, FieldValidationError, RegistryError, WorldStateError};
pub use history::{History, Role, TurnRecord};
pub use monitor::{DispatchResult, Monitor, MonitorKind, MonitorRegistry};
pub use update_set::UpdateSet;
pub use world_state::WorldState;
