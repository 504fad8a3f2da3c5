//! Error types for port operations.

/// Errors calling the external model provider (network, auth, timeout).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    RequestFailed(String),

    #[error("provider request timed out")]
    Timeout,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// Failures turning raw model output into a structured update set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The response text is not syntactically JSON.
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    /// The response parsed, but is not a flat top-level mapping.
    #[error("response is not a mapping, got {0}")]
    NotAMapping(&'static str),
}
