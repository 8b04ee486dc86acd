//! The incremental ingestion pipeline.
//!
//! For every configured subject, in order:
//!
//! 1. **Search**: collect raw snippets ([`crate::search::collect`])
//! 2. **Extract**: turn snippets into events ([`crate::extract::extract`])
//! 3. **Deduplicate**: drop events whose `(subject, partner)` is already known
//! 4. **Append**: push the survivors onto the in-memory history
//!
//! [`refresh`] wraps one ingestion pass with the artifact rules: the history
//! file is written only when something was added or no file existed yet, and
//! the report is rewritten on every run.

use crate::api::CompletionProvider;
use crate::config::RadarConfig;
use crate::dedup::FingerprintSet;
use crate::extract::extract;
use crate::models::{ExtractedRecord, Record};
use crate::outputs::history::HistoryStore;
use crate::outputs::html::render_report;
use crate::pacing::Pacer;
use crate::search::{SearchProvider, collect};
use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub subjects: usize,
    pub snippets: usize,
    pub extracted: usize,
    pub added: usize,
    pub duplicates: usize,
    /// Extracted events dropped for lacking a partner.
    pub rejected: usize,
}

impl RunSummary {
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

/// Append the new records among `candidates` to `history`.
///
/// Returns `(added, duplicates, rejected)`.
pub fn ingest_subject(
    subject: &str,
    candidates: Vec<ExtractedRecord>,
    history: &mut Vec<Record>,
    known: &mut FingerprintSet,
) -> (usize, usize, usize) {
    let (mut added, mut duplicates, mut rejected) = (0, 0, 0);

    for candidate in candidates {
        let Some(record) = Record::from_extracted(subject, candidate) else {
            rejected += 1;
            continue;
        };
        if known.admit(&record) {
            debug!(partner = %record.partner, period = %record.period, "New collaboration");
            history.push(record);
            added += 1;
        } else {
            duplicates += 1;
        }
    }

    if rejected > 0 {
        warn!(subject, rejected, "Dropped extracted records without a partner");
    }
    (added, duplicates, rejected)
}

/// Run every configured subject through search, extraction and dedup.
#[instrument(level = "info", skip_all, fields(subjects = config.subjects.len()))]
pub async fn run<S: SearchProvider, C: CompletionProvider>(
    config: &RadarConfig,
    search: &S,
    completion: &C,
    history: &mut Vec<Record>,
    today: NaiveDate,
) -> RunSummary {
    let mut known = FingerprintSet::from_records(history);
    let mut pacer = Pacer::new(config.search_pause());
    let mut summary = RunSummary::default();

    for subject in &config.subjects {
        summary.subjects += 1;

        let snippets = collect(search, &mut pacer, config, subject).await;
        summary.snippets += snippets.len();

        let candidates = extract(completion, config, subject, &snippets, today).await;
        summary.extracted += candidates.len();

        let (added, duplicates, rejected) = ingest_subject(subject, candidates, history, &mut known);
        summary.added += added;
        summary.duplicates += duplicates;
        summary.rejected += rejected;

        info!(
            subject = %subject,
            snippets = snippets.len(),
            added,
            duplicates,
            "Subject processed"
        );
    }

    info!(
        subjects = summary.subjects,
        snippets = summary.snippets,
        extracted = summary.extracted,
        added = summary.added,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        known = known.len(),
        history = history.len(),
        "Ingestion finished"
    );
    summary
}

/// What one [`refresh`] did to the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub summary: RunSummary,
    /// Records in the history before this run.
    pub loaded: usize,
    /// Records in the history after this run.
    pub total: usize,
    pub history_saved: bool,
}

/// Load the history, ingest every subject, then write the artifacts.
///
/// # Arguments
///
/// * `config` - Resolved configuration, including both artifact paths
/// * `search` / `completion` - The providers used for every subject
/// * `today` - The date the validity cutoff is computed from
/// * `generated_at` - The timestamp printed in the report
///
/// # Returns
///
/// The run counters and whether the history file was written. Only a
/// failure to write an artifact is an error.
#[instrument(level = "info", skip_all, fields(history = %config.history_path.display()))]
pub async fn refresh<S: SearchProvider, C: CompletionProvider>(
    config: &RadarConfig,
    search: &S,
    completion: &C,
    today: NaiveDate,
    generated_at: NaiveDateTime,
) -> Result<RefreshOutcome, Box<dyn Error>> {
    let store = HistoryStore::new(&config.history_path);
    let existed = store.exists().await;
    let mut history = store.load().await;
    let loaded = history.len();

    let summary = run(config, search, completion, &mut history, today).await;

    let history_saved = summary.changed() || !existed;
    if history_saved {
        store.save(&history).await?;
    } else {
        info!(path = %store.path().display(), "No new records; history left untouched");
    }

    let html = render_report(&history, &config.ip_categories, generated_at);
    tokio::fs::write(&config.report_path, html).await?;
    info!(path = %config.report_path.display(), records = history.len(), "Wrote report");

    Ok(RefreshOutcome {
        summary,
        loaded,
        total: history.len(),
        history_saved,
    })
}
