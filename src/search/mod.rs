//! Web search for collaboration news.
//!
//! One query is issued per tracked subject. The query combines the subject
//! with an OR-ed list of trigger keywords:
//!
//! ```text
//! 王者荣耀 (联动 OR 合作 OR 联名 OR 新皮肤)
//! ```
//!
//! # Providers
//!
//! | Provider | Module | Method |
//! |----------|--------|--------|
//! | DuckDuckGo | [`duckduckgo`] | HTML endpoint scraping |
//!
//! [`collect`] wraps a provider with pacing and failure isolation: a failed
//! search is logged and reported as zero results so the remaining subjects
//! still run.

pub mod duckduckgo;

use crate::config::{RadarConfig, Recency};
use crate::models::RawSnippet;
use crate::pacing::Pacer;
use std::error::Error;
use tracing::{error, info, instrument};

pub use duckduckgo::DuckDuckGo;

/// A single search query, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Region/language code, e.g. `cn-zh`.
    pub region: String,
    pub recency: Recency,
    pub max_results: usize,
}

impl SearchRequest {
    /// The request for `subject`, with every other knob taken from `config`.
    pub fn for_subject(config: &RadarConfig, subject: &str) -> Self {
        Self {
            query: build_query(subject, &config.keywords),
            region: config.region.clone(),
            recency: config.recency,
            max_results: config.max_results,
        }
    }
}

/// Build the query text for one subject.
///
/// # Arguments
///
/// * `subject` - The tracked game name
/// * `keywords` - Trigger words, any of which should appear in a hit
///
/// # Returns
///
/// `subject (kw1 OR kw2 ...)`, or just the subject when there are no keywords.
pub fn build_query(subject: &str, keywords: &[String]) -> String {
    if keywords.is_empty() {
        return subject.to_string();
    }
    format!("{} ({})", subject, keywords.join(" OR "))
}

/// A text search backend.
pub trait SearchProvider {
    /// Run one query.
    ///
    /// # Arguments
    ///
    /// * `request` - Query text, region, recency window and result cap
    ///
    /// # Returns
    ///
    /// The hits in ranking order, or an error if the backend could not be
    /// reached or refused the query.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSnippet>, Box<dyn Error>>;
}

/// Search for one subject, never failing.
///
/// Waits on `pacer` first so consecutive subjects keep the configured
/// minimum spacing.
///
/// # Arguments
///
/// * `provider` - The search backend
/// * `pacer` - Shared gate spacing out consecutive searches
/// * `config` - Source of keywords, region, recency and result cap
/// * `subject` - The game being searched for
///
/// # Returns
///
/// At most `max_results` snippets. Provider errors are logged and become an
/// empty result.
#[instrument(level = "info", skip(provider, pacer, config))]
pub async fn collect<S: SearchProvider>(
    provider: &S,
    pacer: &mut Pacer,
    config: &RadarConfig,
    subject: &str,
) -> Vec<RawSnippet> {
    let request = SearchRequest::for_subject(config, subject);
    pacer.ready().await;

    match provider.search(&request).await {
        Ok(mut snippets) => {
            snippets.truncate(request.max_results);
            info!(count = snippets.len(), query = %request.query, "Search finished");
            snippets
        }
        Err(e) => {
            error!(error = %e, query = %request.query, "Search failed; skipping subject");
            Vec::new()
        }
    }
}
