//! The field-keyed delta extracted from a turn.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transient mapping from field name to an update payload.
///
/// Produced fresh each turn by the delta extractor and consumed immediately
/// by the monitor registry; payload shape is interpreted per field by the
/// owning monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateSet {
    updates: Map<String, Value>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, payload: Value) {
        self.updates.insert(field.into(), payload);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.updates.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.updates.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.updates.keys()
    }
}

impl From<Map<String, Value>> for UpdateSet {
    fn from(updates: Map<String, Value>) -> Self {
        Self { updates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_from_flat_object() {
        let set: UpdateSet =
            serde_json::from_str(r#"{"health": 80, "inventory": ["Food"]}"#).expect("flat object");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("health"), Some(&json!(80)));
        assert!(set.contains("inventory"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(serde_json::from_str::<UpdateSet>("[1, 2]").is_err());
        assert!(serde_json::from_str::<UpdateSet>("\"not an object\"").is_err());
    }
}
