//! External service port traits (model provider, narrative, delta extraction).

use async_trait::async_trait;
use taleweaver_domain::{TurnRecord, UpdateSet, WorldState};

mod error;

pub use error::{ExtractionError, ProviderError};

// =============================================================================
// LLM Types
// =============================================================================

/// LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The conversation history
    pub messages: Vec<ChatMessage>,
    /// System prompt / context
    pub system_prompt: Option<String>,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Response from the LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content
    pub content: String,
    /// Finish reason
    pub finish_reason: FinishReason,
    /// Token usage
    pub usage: Option<TokenUsage>,
}

/// Reason the generation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, ProviderError>;
}

// =============================================================================
// Turn pipeline ports
// =============================================================================

/// Produces the free-text narrative for one player action.
///
/// Callers pass a read-only snapshot of the world state and an
/// already-truncated history window.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn generate(
        &self,
        user_input: &str,
        state: &WorldState,
        history: &[TurnRecord],
    ) -> Result<String, ProviderError>;
}

/// Extracts a structured, untrusted update set from a turn's narrative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeltaExtractor: Send + Sync {
    async fn extract(
        &self,
        user_input: &str,
        narrative: &str,
        state: &WorldState,
    ) -> Result<UpdateSet, ExtractionError>;
}
