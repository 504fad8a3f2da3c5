//! The turn pipeline: narrative generation, delta extraction, validation,
//! monitor dispatch, state snapshot.

use std::sync::Arc;

use uuid::Uuid;

use taleweaver_domain::{History, MonitorRegistry, TurnRecord, WorldState};

use crate::infrastructure::ports::{DeltaExtractor, NarrativeProvider};

/// How many history records are passed to the model as context.
pub const HISTORY_CONTEXT_WINDOW: usize = 20;

/// User-visible narrative substituted when generation fails.
pub const FALLBACK_NARRATIVE: &str = "Something went wrong. Please try again.";

/// Drives one full turn: player input in, narrative plus reconciled state out.
///
/// Owns the history log and coordinates world-state mutation; shape knowledge
/// for individual fields lives in the registered monitors. Turns are
/// processed through `&mut self`, which gives the single-writer discipline:
/// turn k+1 can never observe a snapshot predating the merge of turn k.
pub struct TurnOrchestrator {
    state: WorldState,
    history: History,
    registry: MonitorRegistry,
    narrative: Arc<dyn NarrativeProvider>,
    extractor: Arc<dyn DeltaExtractor>,
}

/// What one completed turn hands back to the presentation layer.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    /// Narrative text (or the fallback message on generation failure)
    pub narrative: String,
    /// Display rendering of the post-merge world state
    pub state_view: String,
    /// Non-fatal findings: unknown fields, rejected payloads, skipped updates
    pub warnings: Vec<String>,
}

impl TurnOrchestrator {
    pub fn new(
        initial_state: WorldState,
        registry: MonitorRegistry,
        narrative: Arc<dyn NarrativeProvider>,
        extractor: Arc<dyn DeltaExtractor>,
    ) -> Self {
        Self {
            state: initial_state,
            history: History::new(),
            registry,
            narrative,
            extractor,
        }
    }

    /// Record a scene-setting opening message as the first assistant turn.
    pub fn record_opening(&mut self, message: impl Into<String>) {
        self.history.push(TurnRecord::assistant(message));
    }

    /// Current canonical state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Full untruncated history log.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Process one player turn.
    ///
    /// Nothing here is fatal: every failure degrades to a turn completed
    /// with reduced effect. The turn is atomic with respect to state:
    /// either the fully merged state is installed, or the old state is
    /// retained unchanged.
    pub async fn process_turn(&mut self, input: &str) -> TurnOutcome {
        let turn_id = Uuid::new_v4();
        tracing::debug!(%turn_id, input = input, "turn started");

        self.history.push(TurnRecord::user(input));
        let snapshot = self.state.clone();

        // Narrative generation. On failure the fallback is shown, nothing is
        // appended to history (no narrative was actually produced), and no
        // extraction is attempted against it.
        let narrative = match self
            .narrative
            .generate(input, &snapshot, self.history.recent(HISTORY_CONTEXT_WINDOW))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(%turn_id, %error, "narrative generation failed");
                return TurnOutcome {
                    turn_id,
                    narrative: FALLBACK_NARRATIVE.to_string(),
                    state_view: self.state.format_for_display(),
                    warnings: Vec::new(),
                };
            }
        };
        self.history.push(TurnRecord::assistant(&narrative));

        // Delta extraction. A failure aborts only the state-update phase;
        // the narrative is still delivered and the state stays unchanged.
        let updates = match self.extractor.extract(input, &narrative, &snapshot).await {
            Ok(updates) => updates,
            Err(error) => {
                tracing::warn!(%turn_id, %error, "state update extraction failed");
                return TurnOutcome {
                    turn_id,
                    narrative,
                    state_view: self.state.format_for_display(),
                    warnings: vec![format!("state update skipped: {error}")],
                };
            }
        };

        // Reconciliation: dispatch onto a working copy, then install the
        // merged result as a whole.
        let mut warnings = Vec::new();
        if !updates.is_empty() {
            let result = self.registry.dispatch(&updates, &self.state);
            warnings = result.warnings.iter().map(|w| w.to_string()).collect();
            self.state = result.state;
        }

        tracing::debug!(
            %turn_id,
            updated_fields = updates.len(),
            warning_count = warnings.len(),
            "turn completed"
        );

        TurnOutcome {
            turn_id,
            narrative,
            state_view: self.state.format_for_display(),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        ExtractionError, MockDeltaExtractor, MockNarrativeProvider, ProviderError,
    };
    use serde_json::json;
    use taleweaver_domain::{Monitor, Role, UpdateSet};

    fn initial_state() -> WorldState {
        WorldState::from_value(json!({
            "health": 100,
            "inventory": ["Pipboy"],
            "time": "2:32 PM",
        }))
        .expect("valid state")
    }

    fn registry() -> MonitorRegistry {
        let mut registry = MonitorRegistry::new();
        registry
            .register(Monitor::clamped_numeric("health", 0, 100))
            .expect("health");
        registry.register(Monitor::list("inventory")).expect("inventory");
        registry.register(Monitor::scalar("time")).expect("time");
        registry
    }

    fn updates(value: serde_json::Value) -> UpdateSet {
        serde_json::from_value(value).expect("flat object")
    }

    fn orchestrator(
        narrative: MockNarrativeProvider,
        extractor: MockDeltaExtractor,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(
            initial_state(),
            registry(),
            Arc::new(narrative),
            Arc::new(extractor),
        )
    }

    #[tokio::test]
    async fn test_successful_turn_merges_state() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Ok("A raider clips your shoulder.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor.expect_extract().return_once(|_, _, _| {
            Ok(updates(json!({
                "health": {"delta": -15},
                "time": "2:45 PM",
            })))
        });

        let mut orchestrator = orchestrator(narrative, extractor);
        let outcome = orchestrator.process_turn("sneak past the raiders").await;

        assert_eq!(outcome.narrative, "A raider clips your shoulder.");
        assert!(outcome.warnings.is_empty());
        assert_eq!(orchestrator.state().field("health"), Some(&json!(85)));
        assert_eq!(orchestrator.state().field("time"), Some(&json!("2:45 PM")));
        assert!(outcome.state_view.contains("health: 85"));
    }

    #[tokio::test]
    async fn test_turn_appends_user_and_assistant_records() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Ok("You wait.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor
            .expect_extract()
            .return_once(|_, _, _| Ok(UpdateSet::new()));

        let mut orchestrator = orchestrator(narrative, extractor);
        orchestrator.process_turn("wait").await;

        let records = orchestrator.history().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role, Role::User);
        assert_eq!(records[0].content, "wait");
        assert_eq!(records[1].role, Role::Assistant);
        assert_eq!(records[1].content, "You wait.");
    }

    #[tokio::test]
    async fn test_provider_failure_gives_fallback_and_skips_extraction() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Err(ProviderError::Timeout));

        // No expectation on the extractor: any call would panic the test.
        let extractor = MockDeltaExtractor::new();

        let before = initial_state();
        let mut orchestrator = orchestrator(narrative, extractor);
        let outcome = orchestrator.process_turn("open the vault").await;

        assert_eq!(outcome.narrative, FALLBACK_NARRATIVE);
        assert_eq!(orchestrator.state(), &before);
        // The fallback was never actually narrated, so it is not history.
        assert_eq!(orchestrator.history().len(), 1);
        assert_eq!(orchestrator.history().records()[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_narrative_and_state() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Ok("The merchant shrugs.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor
            .expect_extract()
            .return_once(|_, _, _| Err(ExtractionError::NotJson("expected value".to_string())));

        let before = initial_state();
        let mut orchestrator = orchestrator(narrative, extractor);
        let outcome = orchestrator.process_turn("haggle").await;

        assert_eq!(outcome.narrative, "The merchant shrugs.");
        assert_eq!(orchestrator.state(), &before);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("state update skipped"));
    }

    #[tokio::test]
    async fn test_unknown_field_warns_without_changing_state() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Ok("Nothing happens.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor
            .expect_extract()
            .return_once(|_, _, _| Ok(updates(json!({"foo": 1}))));

        let before = initial_state();
        let mut orchestrator = orchestrator(narrative, extractor);
        let outcome = orchestrator.process_turn("poke the foo").await;

        assert_eq!(orchestrator.state(), &before);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("unknown field 'foo'"));
    }

    #[tokio::test]
    async fn test_malformed_field_does_not_discard_sibling() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .return_once(|_, _, _| Ok("Dusk settles.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor.expect_extract().return_once(|_, _, _| {
            Ok(updates(json!({
                "health": "fine",
                "time": "6:00 PM",
            })))
        });

        let mut orchestrator = orchestrator(narrative, extractor);
        let outcome = orchestrator.process_turn("rest").await;

        assert_eq!(orchestrator.state().field("health"), Some(&json!(100)));
        assert_eq!(orchestrator.state().field("time"), Some(&json!("6:00 PM")));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_history_window_is_truncated_for_the_provider() {
        let mut narrative = MockNarrativeProvider::new();
        narrative
            .expect_generate()
            .times(30)
            .withf(|_, _, history| history.len() <= HISTORY_CONTEXT_WINDOW)
            .returning(|_, _, _| Ok("Onward.".to_string()));

        let mut extractor = MockDeltaExtractor::new();
        extractor
            .expect_extract()
            .times(30)
            .returning(|_, _, _| Ok(UpdateSet::new()));

        let mut orchestrator = orchestrator(narrative, extractor);
        for i in 0..30 {
            orchestrator.process_turn(&format!("step {i}")).await;
        }

        // The full log is still retained for export.
        assert_eq!(orchestrator.history().len(), 60);
    }

    #[tokio::test]
    async fn test_opening_message_is_first_assistant_record() {
        let narrative = MockNarrativeProvider::new();
        let extractor = MockDeltaExtractor::new();
        let mut orchestrator = orchestrator(narrative, extractor);

        orchestrator.record_opening("You find yourself in New Vegas.");

        let records = orchestrator.history().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].role, Role::Assistant);
    }
}
