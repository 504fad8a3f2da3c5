//! Delta extractor backed by the model port.
//!
//! Model output is untrusted input: the raw text is cleaned of markdown
//! fences and model special tokens, then parsed defensively into an
//! [`UpdateSet`] or a typed [`ExtractionError`]. Per-field payload shapes
//! are validated later, at monitor dispatch.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex_lite::Regex;
use serde_json::Value;

use taleweaver_domain::{world_state::json_type_name, UpdateSet, WorldState};

use crate::infrastructure::ports::{DeltaExtractor, ExtractionError, LlmPort, LlmRequest};

const EXTRACTION_TEMPERATURE: f32 = 0.2;
const EXTRACTION_MAX_TOKENS: u32 = 1000;

// Fenced code blocks (```json ... ```), despite the prompt asking for raw JSON
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));

// Model special tokens that may leak through (<|channel|>, <|end|>, ...)
static SPECIAL_TOKENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]+\|>").expect("valid regex"));

/// Extracts a structured update set from the player input, narrative and a
/// state snapshot.
pub struct LlmDeltaExtractor {
    llm: Arc<dyn LlmPort>,
    system_prompt: String,
}

impl LlmDeltaExtractor {
    pub fn new(llm: Arc<dyn LlmPort>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }
}

#[async_trait]
impl DeltaExtractor for LlmDeltaExtractor {
    async fn extract(
        &self,
        user_input: &str,
        narrative: &str,
        state: &WorldState,
    ) -> Result<UpdateSet, ExtractionError> {
        let snapshot = state
            .to_compact_json()
            .unwrap_or_else(|_| "{}".to_string());
        let prompt = format!(
            "{}\n\nCurrent Game State: {snapshot}\n\nPlayer Input: {user_input}\nNarrative: {narrative}",
            self.system_prompt
        );

        let request = LlmRequest::new(Vec::new())
            .with_system_prompt(prompt)
            .with_temperature(EXTRACTION_TEMPERATURE)
            .with_max_tokens(EXTRACTION_MAX_TOKENS);

        let response = self.llm.generate(request).await?;
        parse_update_set(&response.content)
    }
}

/// Parse cleaned model text into a flat update set.
pub fn parse_update_set(raw: &str) -> Result<UpdateSet, ExtractionError> {
    let cleaned = clean_response(raw);

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(raw = raw, error = %e, "update extraction returned non-JSON text");
        ExtractionError::NotJson(e.to_string())
    })?;

    match value {
        Value::Object(map) => Ok(UpdateSet::from(map)),
        other => {
            tracing::warn!(got = json_type_name(&other), "update extraction was not a mapping");
            Err(ExtractionError::NotAMapping(json_type_name(&other)))
        }
    }
}

/// Strip markdown fences and leaked special tokens from raw model output.
fn clean_response(raw: &str) -> String {
    let stripped = SPECIAL_TOKENS_RE.replace_all(raw, "");
    if let Some(caps) = CODE_FENCE_RE.captures(&stripped) {
        if let Some(inner) = caps.get(1) {
            return inner.as_str().trim().to_string();
        }
    }
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_raw_object() {
        let set = parse_update_set(r#"{"health": 80, "time": "3:00 PM"}"#).expect("object");
        assert_eq!(set.get("health"), Some(&json!(80)));
        assert_eq!(set.get("time"), Some(&json!("3:00 PM")));
    }

    #[test]
    fn test_parses_empty_object() {
        let set = parse_update_set("{}").expect("empty object");
        assert!(set.is_empty());
    }

    #[test]
    fn test_strips_code_fence() {
        let raw = "```json\n{\"inventory\": {\"add\": [\"Stimpak\"]}}\n```";
        let set = parse_update_set(raw).expect("fenced object");
        assert!(set.contains("inventory"));
    }

    #[test]
    fn test_strips_special_tokens() {
        let raw = "<|channel|>final<|message|>{\"health\": 55}<|end|>";
        let set = parse_update_set(raw).expect("tokenized object");
        assert_eq!(set.get("health"), Some(&json!(55)));
    }

    #[test]
    fn test_not_json_is_an_extraction_error() {
        let err = parse_update_set("not json").unwrap_err();
        assert!(matches!(err, ExtractionError::NotJson(_)));
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        let err = parse_update_set("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ExtractionError::NotAMapping("array")));

        let err = parse_update_set("42").unwrap_err();
        assert!(matches!(err, ExtractionError::NotAMapping("number")));
    }
}
