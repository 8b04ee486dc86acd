//! # Game Collab Radar
//!
//! Tracks brand collaborations and IP crossovers for a fixed list of games.
//! Each run searches the web for recent news about every game, asks an
//! OpenAI-compatible LLM to pull out officially confirmed collaborations,
//! merges the new ones into a persisted history and re-renders a static HTML
//! report of everything seen so far.
//!
//! ## Usage
//!
//! ```sh
//! LLM_API_KEY=sk-... game_collab_radar --history-path data/history.json --report-path index.html
//! ```
//!
//! ## Architecture
//!
//! The application follows a sequential pipeline architecture:
//! 1. **Search**: One paced DuckDuckGo query per game
//! 2. **Extraction**: One low-temperature completion per game with results
//! 3. **Dedup**: Drop collaborations whose `(game, partner)` is already known
//! 4. **Output**: Save the history if it changed, always rewrite the report
//!
//! A failing search or completion only costs that game's results for this
//! run. Only a failure to write the artifacts aborts the process.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dedup;
mod extract;
mod models;
mod outputs;
mod pacing;
mod pipeline;
mod search;
mod utils;

use api::ChatClient;
use cli::Cli;
use config::RadarConfig;
use search::DuckDuckGo;
use utils::ensure_parent_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("game_collab_radar starting up");

    // --- Configuration ---
    let args = Cli::parse();
    let mut config = RadarConfig::load(args.config.as_deref().map(Path::new))?;
    config.apply_cli(&args);
    debug!(?config.history_path, ?config.report_path, subjects = ?config.subjects, "Resolved configuration");

    if config.api_key.is_none() {
        warn!("LLM_API_KEY is not set; completions will be rejected and no records extracted");
    }

    // Fail before any network work if the outputs cannot be written
    ensure_parent_dir(&config.history_path).await?;
    ensure_parent_dir(&config.report_path).await?;

    // --- Ingest, persist, report ---
    let search = DuckDuckGo::new(config.request_timeout())?;
    let completion = ChatClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.request_timeout(),
    )?;
    let now = Local::now().naive_local();
    let outcome = pipeline::refresh(&config, &search, &completion, now.date(), now).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        loaded = outcome.loaded,
        added = outcome.summary.added,
        total = outcome.total,
        history_saved = outcome.history_saved,
        "Execution complete"
    );

    Ok(())
}
