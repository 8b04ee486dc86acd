//! Run configuration.
//!
//! A [`RadarConfig`] is assembled once in `main` from three layers, lowest
//! precedence first:
//!
//! 1. Built-in defaults ([`RadarConfig::default`])
//! 2. An optional YAML file (every key optional)
//! 3. Command-line flags and their environment variables
//!
//! The resulting value is passed by reference into every component.
//!
//! # Example file
//!
//! ```yaml
//! subjects: ["王者荣耀", "KPL"]
//! keywords: ["联动", "联名"]
//! recency: year
//! max_results: 10
//! model: gpt-4o-mini
//! base_url: https://api.openai.com/v1
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Search recency window.
///
/// Shorter windows keep results fresh, longer ones trade staleness for recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    Day,
    Week,
    Month,
    Year,
}

impl Recency {
    /// The single-letter code the search provider expects.
    pub fn code(self) -> &'static str {
        match self {
            Recency::Day => "d",
            Recency::Week => "w",
            Recency::Month => "m",
            Recency::Year => "y",
        }
    }
}

/// Everything a run needs to know, built once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Tracked games.
    pub subjects: Vec<String>,
    /// Trigger words OR-ed into every query.
    pub keywords: Vec<String>,
    /// Search region/language code.
    pub region: String,
    pub recency: Recency,
    /// Upper bound on results per subject; bounds extraction cost.
    pub max_results: usize,
    /// Minimum spacing between two search calls, in seconds.
    pub search_pause_secs: u64,
    /// Timeout applied to every outbound HTTP call, in seconds.
    pub request_timeout_secs: u64,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Events older than this many months are excluded by the prompt.
    pub validity_months: u32,
    /// Categories rendered with the "content/IP" tag style.
    pub ip_categories: Vec<String>,
    pub history_path: PathBuf,
    pub report_path: PathBuf,
    /// Never read from the config file; only from the CLI/environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            subjects: to_strings(&[
                "王者荣耀",
                "无畏契约",
                "蛋仔派对",
                "KPL",
                "LPL",
                "三角洲行动",
                "英雄联盟",
            ]),
            keywords: to_strings(&["联动", "合作", "联名", "新皮肤"]),
            region: "cn-zh".to_string(),
            recency: Recency::Week,
            max_results: 8,
            search_pause_secs: 2,
            request_timeout_secs: 30,
            model: "deepseek-chat".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            temperature: 0.1,
            validity_months: 18,
            ip_categories: to_strings(&["动漫", "游戏", "影视", "文旅"]),
            history_path: PathBuf::from("data/history.json"),
            report_path: PathBuf::from("index.html"),
            api_key: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RadarConfig {
    /// Load the defaults, overlaid with a YAML file when one is given.
    ///
    /// Unlike the history file, a broken config file is a hard error: running
    /// with silently different settings is worse than not running.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<RadarConfig, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(RadarConfig::default());
        };

        let raw = std::fs::read_to_string(path)?;
        let config: RadarConfig = serde_yaml::from_str(&raw)?;
        info!(path = %path.display(), subjects = config.subjects.len(), "Loaded configuration");
        Ok(config)
    }

    /// Overlay command-line flags on top of the loaded configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.history_path {
            self.history_path = PathBuf::from(path);
        }
        if let Some(path) = &cli.report_path {
            self.report_path = PathBuf::from(path);
        }
        if !cli.subjects.is_empty() {
            self.subjects = cli.subjects.clone();
        }
        if let Some(recency) = cli.recency {
            self.recency = recency;
        }
        if let Some(max) = cli.max_results {
            self.max_results = max;
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        self.api_key = cli.api_key.clone().filter(|k| !k.trim().is_empty());
    }

    pub fn search_pause(&self) -> Duration {
        Duration::from_secs(self.search_pause_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
