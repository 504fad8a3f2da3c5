//! Taleweaver Engine library.
//!
//! The turn pipeline and its collaborators:
//!
//! - `infrastructure/` - Ports and adapters (model client, narrative
//!   provider, delta extractor, settings, session export)
//! - `use_cases/` - Turn orchestration
//! - `scenario` - Initial state, prompts, and opening message

pub mod infrastructure;
pub mod scenario;
pub mod use_cases;

pub use scenario::Scenario;
pub use use_cases::{TurnOrchestrator, TurnOutcome};
