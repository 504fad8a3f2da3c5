//! Error and warning types for state reconciliation.

/// A per-field payload had the wrong shape for its monitor.
///
/// This is local to one field: dispatch converts it into a warning and the
/// rest of the update set still applies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payload for field '{field}': {reason}")]
pub struct FieldValidationError {
    pub field: String,
    pub reason: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Monitor registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two monitors claimed the same field key. Detected at registration so
    /// write conflicts can never arise silently at dispatch time.
    #[error("a monitor for field '{0}' is already registered")]
    DuplicateKey(String),
}

/// World state access and serialization errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldStateError {
    /// A dotted path tried to descend through a non-mapping value.
    #[error("path '{path}' traverses a non-mapping value")]
    NotAMapping { path: String },

    /// The state document was not a JSON object.
    #[error("world state must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Non-fatal findings collected while dispatching an update set.
///
/// Warnings are surfaced to the caller alongside the narrative; they never
/// block turn completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchWarning {
    /// The update set referenced a field with no registered monitor.
    UnknownField { field: String },
    /// A field payload was rejected by its monitor; that field was skipped.
    InvalidPayload { field: String, reason: String },
    /// An `add` instruction tried to introduce items already present.
    DuplicateItems { field: String, items: Vec<String> },
}

impl std::fmt::Display for DispatchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { field } => {
                write!(f, "unknown field '{field}' has no registered monitor")
            }
            Self::InvalidPayload { field, reason } => {
                write!(f, "field '{field}' was not updated: {reason}")
            }
            Self::DuplicateItems { field, items } => {
                write!(
                    f,
                    "field '{field}' received duplicate items: {}",
                    items.join(", ")
                )
            }
        }
    }
}

impl From<FieldValidationError> for DispatchWarning {
    fn from(e: FieldValidationError) -> Self {
        Self::InvalidPayload {
            field: e.field,
            reason: e.reason,
        }
    }
}
