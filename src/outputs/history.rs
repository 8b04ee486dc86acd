//! Persisted collaboration history.
//!
//! The history is a single pretty-printed JSON array of [`Record`]s, committed
//! alongside the report so it survives between runs:
//!
//! ```text
//! data/history.json
//! [
//!   {
//!     "subject": "王者荣耀",
//!     "partner": "肯德基",
//!     "category": "餐饮",
//!     "description": "宅急送联动，推出限定套餐和皮肤",
//!     "period": "2024-05",
//!     "source_url": "http://..."
//!   }
//! ]
//! ```
//!
//! # Corruption
//!
//! An unreadable or unparseable file is logged and treated as an empty
//! history. The run then starts fresh and the next save overwrites the
//! broken file. Individual records with a blank subject or partner are
//! skipped with a warning.

use crate::models::Record;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Owner of the on-disk history file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a history file is present at all, readable or not.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the full history, or an empty one if there is nothing usable.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Vec<Record> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No history yet; starting empty");
                return Vec::new();
            }
            Err(e) => {
                error!(error = %e, "History unreadable; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => {
                let total = records.len();
                let records: Vec<Record> = records
                    .into_iter()
                    .filter(|r| !r.subject.trim().is_empty() && !r.partner.trim().is_empty())
                    .collect();
                if records.len() < total {
                    warn!(
                        dropped = total - records.len(),
                        "Ignoring history records without a subject or partner"
                    );
                }
                info!(count = records.len(), "Loaded history");
                records
            }
            Err(e) => {
                warn!(error = %e, "History is corrupt; starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the history file with `records`, in order.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = records.len()))]
    pub async fn save(&self, records: &[Record]) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(records)?;
        ensure_parent_dir(&self.path).await?;
        fs::write(&self.path, json).await?;
        info!("Wrote history");
        Ok(())
    }
}
