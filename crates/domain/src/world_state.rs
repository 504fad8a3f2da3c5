//! Canonical mutable world state.
//!
//! The field set is open-ended: new fields may appear as the game world
//! grows, so no schema is enforced at this layer. Shape invariants (a list
//! field stays a list, a bounded number stays in bounds) are owned by the
//! monitors in [`crate::monitor`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorldStateError;

/// Mapping from field name to a JSON-shaped value: scalar, ordered sequence
/// of scalars, or nested mapping (`limb.left_leg.hp`).
///
/// Constructed once at game start, mutated only through monitor dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState {
    fields: Map<String, Value>,
}

impl WorldState {
    /// Build a state from an initial configuration document.
    ///
    /// The document must be a JSON object keyed by field name.
    pub fn from_value(value: Value) -> Result<Self, WorldStateError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(WorldStateError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Top-level field value, if present.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Replace a top-level field wholesale.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Resolve a dotted path like `limb.left_leg.hp`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for segment in path.split('.') {
            current = match current {
                None => self.fields.get(segment),
                Some(Value::Object(map)) => map.get(segment),
                Some(_) => return None,
            };
            current?;
        }
        current
    }

    /// Set a value at a dotted path, creating intermediate mappings as
    /// needed. Fails if the path descends through an existing non-mapping
    /// value rather than silently coercing it.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), WorldStateError> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut current = &mut self.fields;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(WorldStateError::NotAMapping {
                        path: path.to_string(),
                    })
                }
            };
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Iterate top-level fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Render every top-level field as `key: value` for display.
    ///
    /// Sequences are comma-joined (`empty` when zero-length); nested
    /// mappings are pretty-printed.
    pub fn format_for_display(&self) -> String {
        let mut lines = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            lines.push(format!("{key}: {}", display_value(value)));
        }
        lines.join("\n")
    }

    /// Canonical JSON serialization of the full state.
    pub fn to_json(&self) -> Result<String, WorldStateError> {
        serde_json::to_string_pretty(&self.fields)
            .map_err(|e| WorldStateError::Serialization(e.to_string()))
    }

    /// Compact JSON, used when embedding the state into a model prompt.
    pub fn to_compact_json(&self) -> Result<String, WorldStateError> {
        serde_json::to_string(&self.fields)
            .map_err(|e| WorldStateError::Serialization(e.to_string()))
    }

    /// Parse a state previously produced by [`WorldState::to_json`].
    pub fn from_json(json: &str) -> Result<Self, WorldStateError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| WorldStateError::Serialization(e.to_string()))?;
        Self::from_value(value)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Array(items) if items.is_empty() => "empty".to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_scalar)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".into()),
        other => display_scalar(other),
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Human-readable JSON type name, used in validation errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
