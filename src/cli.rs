//! Command-line interface definitions for the collaboration radar.
//!
//! Every flag is optional: anything left unset falls back to the YAML config
//! file (when `--config` is given) and then to the built-in defaults. See
//! [`crate::config::RadarConfig::apply_cli`].

use crate::config::Recency;
use clap::Parser;

/// Command-line arguments for the collaboration radar.
///
/// # Examples
///
/// ```sh
/// # Default subjects, history in ./data, report in ./index.html
/// LLM_API_KEY=sk-... game_collab_radar
///
/// # Only two games, looking back a whole year
/// game_collab_radar --subject 王者荣耀 --subject KPL --recency year
///
/// # Use an OpenAI endpoint instead of DeepSeek
/// game_collab_radar --base-url https://api.openai.com/v1 --model gpt-4o-mini
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Where the accumulated history JSON is read from and written to
    #[arg(long)]
    pub history_path: Option<String>,

    /// Where the HTML report is written
    #[arg(short, long)]
    pub report_path: Option<String>,

    /// Track only these subjects (repeatable); replaces the configured list
    #[arg(short, long = "subject")]
    pub subjects: Vec<String>,

    /// How far back search results may reach
    #[arg(long, value_enum)]
    pub recency: Option<Recency>,

    /// Maximum search results requested per subject
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Model identifier sent to the completion endpoint
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// Credential for the completion API
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}
