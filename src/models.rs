//! Data models for search snippets and collaboration records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawSnippet`]: A single search hit, ephemeral and never persisted
//! - [`ExtractedRecord`]: A collaboration event as emitted by the LLM, before
//!   the tracked subject is attached
//! - [`Record`]: A confirmed collaboration event as persisted in the history
//!
//! The LLM speaks in the original prompt's vocabulary (`brand`, `date`, ...),
//! the history file speaks in the record vocabulary (`partner`, `period`, ...).
//! [`Record::from_extracted`] is the only bridge between the two.

use serde::{Deserialize, Serialize};

/// A raw search result as returned by the search provider.
///
/// Snippets only live for the duration of a single subject's processing:
/// they are produced by the search collector and consumed by the extraction
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnippet {
    /// The result headline.
    pub title: String,
    /// The resolved link to the result page.
    pub url: String,
    /// The free-text excerpt shown under the result.
    pub body: String,
}

/// A collaboration event exactly as decoded from the model output.
///
/// Every field is required and must be a JSON string. The original prompt
/// used `industry` and `content` for what is now `category` and
/// `description`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractedRecord {
    /// The collaborating brand or IP.
    pub brand: String,
    /// Free-text classification label (e.g. "餐饮", "动漫").
    #[serde(alias = "industry")]
    pub category: String,
    /// One-sentence summary of the collaboration.
    #[serde(alias = "content")]
    pub description: String,
    /// Year and month of the announcement, `YYYY-MM`.
    pub date: String,
    /// Link to the announcement.
    pub source_url: String,
}

/// A single confirmed collaboration event, as stored in the history file.
///
/// `subject` and `partner` are never empty for a persisted record; the other
/// fields may be empty strings but are always present in the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// The tracked game the event belongs to.
    pub subject: String,
    /// The collaborating brand or IP.
    pub partner: String,
    /// Free-text classification label.
    pub category: String,
    /// One-sentence summary.
    pub description: String,
    /// `YYYY-MM`, used for display and ordering. May be empty or malformed.
    pub period: String,
    /// The originating link.
    pub source_url: String,
}

impl Record {
    /// Attach a subject to an extracted event.
    ///
    /// Returns `None` when either the subject or the partner is blank, since
    /// such a record could never be persisted.
    pub fn from_extracted(subject: &str, extracted: ExtractedRecord) -> Option<Record> {
        let subject = subject.trim();
        let partner = extracted.brand.trim();
        if subject.is_empty() || partner.is_empty() {
            return None;
        }

        Some(Record {
            subject: subject.to_string(),
            partner: partner.to_string(),
            category: extracted.category.trim().to_string(),
            description: extracted.description.trim().to_string(),
            period: extracted.date.trim().to_string(),
            source_url: extracted.source_url.trim().to_string(),
        })
    }
}
