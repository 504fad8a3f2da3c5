//! Append-only turn history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single immutable entry in the turn history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: Role,
    pub content: String,
    /// Timestamp when this record was appended
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered, append-only log of turn records.
///
/// Model context uses a truncated recent window, but the full log is
/// retained for persistence and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<TurnRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TurnRecord) {
        self.records.push(record);
    }

    /// The full untruncated log.
    pub fn records(&self) -> &[TurnRecord] {
        &self.records
    }

    /// The most recent `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[TurnRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_window() {
        let mut history = History::new();
        for i in 0..30 {
            history.push(TurnRecord::user(format!("turn {i}")));
        }

        let recent = history.recent(20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].content, "turn 10");
        assert_eq!(recent[19].content, "turn 29");
        // Full log retained
        assert_eq!(history.len(), 30);
    }

    #[test]
    fn test_recent_shorter_than_window() {
        let mut history = History::new();
        history.push(TurnRecord::user("hello"));
        history.push(TurnRecord::assistant("greetings"));

        assert_eq!(history.recent(20).len(), 2);
        assert_eq!(history.recent(20)[0].role, Role::User);
        assert_eq!(history.recent(20)[1].role, Role::Assistant);
    }
}
