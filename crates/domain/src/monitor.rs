//! Per-field monitors and the dispatch registry.
//!
//! Each monitor owns exactly one top-level field and knows how to merge one
//! kind of update payload into the world state. Monitors are total over the
//! payloads they accept and reject everything else with a
//! [`FieldValidationError`] instead of panicking; dispatch converts those
//! rejections into warnings so one malformed field never discards a
//! well-formed sibling update.

use serde_json::{Map, Value};

use crate::error::{DispatchWarning, FieldValidationError, RegistryError};
use crate::update_set::UpdateSet;
use crate::world_state::{json_type_name, WorldState};

/// The closed set of payload shapes a monitor can reduce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorKind {
    /// Plain replacement of a scalar field (time, location name).
    ReplaceScalar,
    /// List field: full replacement array or `{add, remove}` instructions.
    AddRemoveList,
    /// Bounded numeric field: absolute value or `{"delta": n}`, silently
    /// clamped to `[min, max]`.
    ClampedNumeric { min: i64, max: i64 },
    /// Keyed nested-record field: per-sub-key upsert, never a full-field
    /// replacement, so siblings untouched by this turn are preserved.
    PartialNestedMerge,
}

/// A named reducer for a single field of the world state.
///
/// Stateless across turns; registered once at startup.
#[derive(Debug, Clone)]
pub struct Monitor {
    key: String,
    kind: MonitorKind,
}

impl Monitor {
    pub fn scalar(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: MonitorKind::ReplaceScalar,
        }
    }

    pub fn list(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: MonitorKind::AddRemoveList,
        }
    }

    pub fn clamped_numeric(key: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            key: key.into(),
            kind: MonitorKind::ClampedNumeric { min, max },
        }
    }

    pub fn nested_merge(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: MonitorKind::PartialNestedMerge,
        }
    }

    /// The field key this monitor owns.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &MonitorKind {
        &self.kind
    }

    /// Merge `payload` into `state`, returning any data-quality warnings.
    ///
    /// On a shape mismatch the state is left untouched for this field.
    pub fn apply(
        &self,
        payload: &Value,
        state: &mut WorldState,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        match &self.kind {
            MonitorKind::ReplaceScalar => self.apply_scalar(payload, state),
            MonitorKind::AddRemoveList => self.apply_list(payload, state),
            MonitorKind::ClampedNumeric { min, max } => {
                self.apply_clamped(payload, state, *min, *max)
            }
            MonitorKind::PartialNestedMerge => self.apply_nested(payload, state),
        }
    }

    fn apply_scalar(
        &self,
        payload: &Value,
        state: &mut WorldState,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        match payload {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                state.set_field(&self.key, payload.clone());
                Ok(Vec::new())
            }
            other => Err(FieldValidationError::new(
                &self.key,
                format!("expected a scalar, got {}", json_type_name(other)),
            )),
        }
    }

    fn apply_list(
        &self,
        payload: &Value,
        state: &mut WorldState,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        match payload {
            // Full replacement; deduplicated so a replayed update set does
            // not multiply items.
            Value::Array(items) => {
                let mut deduped: Vec<Value> = Vec::with_capacity(items.len());
                let mut duplicates = Vec::new();
                for item in items {
                    if deduped.contains(item) {
                        duplicates.push(display_item(item));
                    } else {
                        deduped.push(item.clone());
                    }
                }
                state.set_field(&self.key, Value::Array(deduped));
                Ok(self.duplicate_warnings(duplicates))
            }
            Value::Object(instructions) => self.apply_add_remove(instructions, state),
            other => Err(FieldValidationError::new(
                &self.key,
                format!(
                    "expected an array or {{add, remove}} object, got {}",
                    json_type_name(other)
                ),
            )),
        }
    }

    fn apply_add_remove(
        &self,
        instructions: &Map<String, Value>,
        state: &mut WorldState,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        for key in instructions.keys() {
            if key != "add" && key != "remove" {
                return Err(FieldValidationError::new(
                    &self.key,
                    format!("unexpected instruction key '{key}'"),
                ));
            }
        }
        if instructions.is_empty() {
            return Err(FieldValidationError::new(
                &self.key,
                "instruction object must contain 'add' and/or 'remove'",
            ));
        }

        let added = instruction_items(instructions, "add")
            .map_err(|found| self.bad_instruction("add", found))?;
        let removed = instruction_items(instructions, "remove")
            .map_err(|found| self.bad_instruction("remove", found))?;

        let mut current: Vec<Value> = match state.field(&self.key) {
            Some(Value::Array(items)) => items.clone(),
            None => Vec::new(),
            Some(other) => {
                // The declared shape of the field itself is wrong; refuse to
                // coerce it into a list.
                return Err(FieldValidationError::new(
                    &self.key,
                    format!(
                        "current value is {}, not a list",
                        json_type_name(other)
                    ),
                ));
            }
        };

        // Removing an absent item is a no-op, not an error.
        current.retain(|item| !removed.contains(item));

        let mut duplicates = Vec::new();
        for item in added {
            if current.contains(&item) {
                duplicates.push(display_item(&item));
            } else {
                current.push(item);
            }
        }

        state.set_field(&self.key, Value::Array(current));
        Ok(self.duplicate_warnings(duplicates))
    }

    fn apply_clamped(
        &self,
        payload: &Value,
        state: &mut WorldState,
        min: i64,
        max: i64,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        let current = state
            .field(&self.key)
            .and_then(Value::as_i64)
            .unwrap_or(max);

        let target = if let Some(absolute) = payload.as_i64() {
            absolute
        } else if let Some(delta) = payload
            .as_object()
            .filter(|obj| obj.len() == 1)
            .and_then(|obj| obj.get("delta"))
            .and_then(Value::as_i64)
        {
            current.saturating_add(delta)
        } else {
            return Err(FieldValidationError::new(
                &self.key,
                format!(
                    "expected an integer or {{\"delta\": n}}, got {}",
                    json_type_name(payload)
                ),
            ));
        };

        // Clamping is silent but observable via the resulting state.
        state.set_field(&self.key, Value::from(target.clamp(min, max)));
        Ok(Vec::new())
    }

    fn apply_nested(
        &self,
        payload: &Value,
        state: &mut WorldState,
    ) -> Result<Vec<DispatchWarning>, FieldValidationError> {
        let patch = match payload {
            Value::Object(map) => map,
            other => {
                return Err(FieldValidationError::new(
                    &self.key,
                    format!("expected a partial mapping, got {}", json_type_name(other)),
                ))
            }
        };

        let mut current = match state.field(&self.key) {
            Some(Value::Object(map)) => map.clone(),
            None => Map::new(),
            Some(other) => {
                return Err(FieldValidationError::new(
                    &self.key,
                    format!(
                        "current value is {}, not a mapping",
                        json_type_name(other)
                    ),
                ));
            }
        };

        for (sub_key, sub_value) in patch {
            match (current.get_mut(sub_key), sub_value) {
                // Partial patch of an existing sub-record: overwrite matching
                // attributes, keep the rest.
                (Some(Value::Object(existing)), Value::Object(attrs)) => {
                    for (attr, value) in attrs {
                        existing.insert(attr.clone(), value.clone());
                    }
                }
                // Upsert: create if absent, replace otherwise.
                _ => {
                    current.insert(sub_key.clone(), sub_value.clone());
                }
            }
        }

        state.set_field(&self.key, Value::Object(current));
        Ok(Vec::new())
    }

    fn duplicate_warnings(&self, duplicates: Vec<String>) -> Vec<DispatchWarning> {
        if duplicates.is_empty() {
            Vec::new()
        } else {
            vec![DispatchWarning::DuplicateItems {
                field: self.key.clone(),
                items: duplicates,
            }]
        }
    }

    fn bad_instruction(&self, which: &str, found: &'static str) -> FieldValidationError {
        FieldValidationError::new(&self.key, format!("'{which}' must be an array, got {found}"))
    }
}

fn instruction_items<'a>(
    instructions: &'a Map<String, Value>,
    key: &str,
) -> Result<Vec<Value>, &'static str> {
    match instructions.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(json_type_name(other)),
    }
}

fn display_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of dispatching an update set: the fully merged state plus any
/// non-fatal warnings collected along the way.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub state: WorldState,
    pub warnings: Vec<DispatchWarning>,
}

/// Insertion-ordered collection of monitors.
///
/// No two monitors may claim the same key; duplicates fail at registration
/// rather than resolving silently to last-registered-wins.
#[derive(Debug, Clone, Default)]
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, monitor: Monitor) -> Result<(), RegistryError> {
        if self.monitors.iter().any(|m| m.key() == monitor.key()) {
            return Err(RegistryError::DuplicateKey(monitor.key().to_string()));
        }
        self.monitors.push(monitor);
        Ok(())
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// Apply every monitored key of `updates` to a copy of `state`, in
    /// registration order.
    ///
    /// A monitor failure aborts only that key's update; keys with no
    /// registered monitor are collected as unknown-field warnings. The input
    /// state is never partially mutated: callers install the returned state
    /// as a whole.
    pub fn dispatch(&self, updates: &UpdateSet, state: &WorldState) -> DispatchResult {
        let mut next = state.clone();
        let mut warnings = Vec::new();

        for monitor in &self.monitors {
            let Some(payload) = updates.get(monitor.key()) else {
                continue;
            };
            match monitor.apply(payload, &mut next) {
                Ok(mut collected) => {
                    for warning in &collected {
                        tracing::warn!(field = monitor.key(), %warning, "data-quality warning");
                    }
                    warnings.append(&mut collected);
                    tracing::debug!(field = monitor.key(), "applied update");
                }
                Err(error) => {
                    tracing::warn!(field = monitor.key(), %error, "rejected field update");
                    warnings.push(error.into());
                }
            }
        }

        for field in updates.keys() {
            if !self.monitors.iter().any(|m| m.key() == field) {
                tracing::warn!(field = %field, "update for unmonitored field ignored");
                warnings.push(DispatchWarning::UnknownField {
                    field: field.clone(),
                });
            }
        }

        DispatchResult {
            state: next,
            warnings,
        }
    }
}
