//! Narrative provider backed by the model port.

use std::sync::Arc;

use async_trait::async_trait;

use taleweaver_domain::{Role, TurnRecord, WorldState};

use crate::infrastructure::ports::{
    ChatMessage, LlmPort, LlmRequest, NarrativeProvider, ProviderError,
};

const NARRATIVE_TEMPERATURE: f32 = 0.7;
const NARRATIVE_MAX_TOKENS: u32 = 300;

/// Generates the turn narrative from the player input, a state snapshot and
/// the truncated history window.
pub struct LlmNarrativeProvider {
    llm: Arc<dyn LlmPort>,
    system_prompt: String,
}

impl LlmNarrativeProvider {
    pub fn new(llm: Arc<dyn LlmPort>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }
}

#[async_trait]
impl NarrativeProvider for LlmNarrativeProvider {
    async fn generate(
        &self,
        user_input: &str,
        state: &WorldState,
        history: &[TurnRecord],
    ) -> Result<String, ProviderError> {
        let system_prompt = match state.to_compact_json() {
            Ok(snapshot) => format!("{}\n\nCurrent world state: {snapshot}", self.system_prompt),
            Err(e) => {
                tracing::warn!(error = %e, "could not embed state snapshot in prompt");
                self.system_prompt.clone()
            }
        };

        let mut messages: Vec<ChatMessage> = history
            .iter()
            .map(|record| match record.role {
                Role::User => ChatMessage::user(&record.content),
                Role::Assistant => ChatMessage::assistant(&record.content),
            })
            .collect();

        // The orchestrator appends the player input to history before the
        // call; cover direct callers that pass a stale window.
        if !messages
            .last()
            .is_some_and(|m| m.content == user_input)
        {
            messages.push(ChatMessage::user(user_input));
        }

        let request = LlmRequest::new(messages)
            .with_system_prompt(system_prompt)
            .with_temperature(NARRATIVE_TEMPERATURE)
            .with_max_tokens(NARRATIVE_MAX_TOKENS);

        let response = self.llm.generate(request).await?;
        let narrative = response.content.trim().to_string();
        if narrative.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "narrative generated"
            );
        }

        Ok(narrative)
    }
}
