//! Taleweaver Engine - Main entry point.
//!
//! Thin line-based shell around the turn orchestrator; all game semantics
//! live in the library.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taleweaver_engine::infrastructure::export::SessionSnapshot;
use taleweaver_engine::infrastructure::extraction::LlmDeltaExtractor;
use taleweaver_engine::infrastructure::narrative::LlmNarrativeProvider;
use taleweaver_engine::infrastructure::openai::OpenAiClient;
use taleweaver_engine::infrastructure::ports::LlmPort;
use taleweaver_engine::infrastructure::settings::AppSettings;
use taleweaver_engine::{Scenario, TurnOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment (OPENAI_API_KEY etc.) from a local .env if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taleweaver_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taleweaver Engine");

    let settings = AppSettings::from_env().context("loading settings from environment")?;
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "model configured");

    let scenario = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading scenario file {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing scenario file {path}"))?
        }
        None => Scenario::demo().context("building demo scenario")?,
    };
    let registry = Scenario::demo_registry().context("building monitor registry")?;

    let llm: Arc<dyn LlmPort> = Arc::new(OpenAiClient::from_settings(&settings));
    let narrative = Arc::new(LlmNarrativeProvider::new(
        llm.clone(),
        scenario.narrative_prompt.clone(),
    ));
    let extractor = Arc::new(LlmDeltaExtractor::new(
        llm,
        scenario.update_prompt.clone(),
    ));

    let mut orchestrator = TurnOrchestrator::new(
        scenario.initial_state.clone(),
        registry,
        narrative,
        extractor,
    );

    let mut stdout = tokio::io::stdout();
    if let Some(opening) = &scenario.opening_message {
        orchestrator.record_opening(opening.clone());
        stdout.write_all(format!("{opening}\n\n").as_bytes()).await?;
    }
    stdout
        .write_all(b"Commands: :state, :export [path], quit\n\n> ")
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "quit" | "exit" => break,
            ":state" => {
                stdout
                    .write_all(format!("{}\n", orchestrator.state().format_for_display()).as_bytes())
                    .await?;
            }
            _ if input.starts_with(":export") => {
                let path = input
                    .strip_prefix(":export")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or("session.json");
                let snapshot = SessionSnapshot::new(
                    orchestrator.state().clone(),
                    orchestrator.history().clone(),
                );
                std::fs::write(path, snapshot.to_json()?)
                    .with_context(|| format!("writing snapshot to {path}"))?;
                stdout
                    .write_all(format!("session exported to {path}\n").as_bytes())
                    .await?;
            }
            _ => {
                let outcome = orchestrator.process_turn(input).await;
                stdout
                    .write_all(format!("\n{}\n", outcome.narrative).as_bytes())
                    .await?;
                for warning in &outcome.warnings {
                    stdout
                        .write_all(format!("  ! {warning}\n").as_bytes())
                        .await?;
                }
                stdout.write_all(b"\n").await?;
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    tracing::info!("Shutting down");
    Ok(())
}
