//! JSON session export.
//!
//! Snapshots pair the canonical world state with the full untruncated turn
//! history so a session can be persisted and resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taleweaver_domain::{History, WorldState};

/// Complete snapshot of a play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub metadata: SnapshotMetadata,
    pub state: WorldState,
    pub history: History,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub engine_version: String,
}

impl SessionSnapshot {
    pub fn new(state: WorldState, history: History) -> Self {
        Self {
            metadata: SnapshotMetadata {
                version: "1".to_string(),
                exported_at: Utc::now(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            state,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taleweaver_domain::TurnRecord;

    #[test]
    fn test_snapshot_round_trip() {
        let state = WorldState::from_value(json!({
            "health": 75,
            "inventory": ["Pipboy"],
        }))
        .expect("valid state");

        let mut history = History::new();
        history.push(TurnRecord::user("look around"));
        history.push(TurnRecord::assistant("You see sand. Endless sand."));

        let snapshot = SessionSnapshot::new(state, history);
        let json = snapshot.to_json().expect("serialize");
        let restored = SessionSnapshot::from_json(&json).expect("parse");

        assert_eq!(restored, snapshot);
        assert_eq!(restored.history.len(), 2);
    }
}
