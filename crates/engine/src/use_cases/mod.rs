//! Turn orchestration over the domain and the ports.

pub mod turn;

pub use turn::{TurnOrchestrator, TurnOutcome, FALLBACK_NARRATIVE, HISTORY_CONTEXT_WINDOW};
