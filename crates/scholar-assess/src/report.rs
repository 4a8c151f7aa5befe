//! Persisted proficiency reports.
//!
//! A report is read at the start of a session and written at the end; the
//! diff between the prior report and the current run measures progress. The
//! on-disk format is pretty-printed JSON and round-trips all counts exactly.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use scholar_core::{Error, Result};

use crate::aggregator::TopicRecord;

/// Per-topic correctness counters persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyReport {
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
    /// Counters keyed by topic name.
    pub topics: BTreeMap<String, TopicRecord>,
}

impl ProficiencyReport {
    /// Creates a report from a snapshot, stamped with the current time.
    #[must_use]
    pub fn new(topics: BTreeMap<String, TopicRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            topics,
        }
    }

    /// Writes the report as pretty-printed JSON, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write
    /// fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        info!(
            path = %path.display(),
            topics = self.topics.len(),
            "Saved proficiency report"
        );
        Ok(())
    }

    /// Reads a report back from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReport`] when the file exists but does not
    /// parse, and an I/O error when it cannot be read.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).await?;
        serde_json::from_str(&contents).map_err(|error| {
            Error::MalformedReport(format!("{}: {error}", path.display()))
        })
    }

    /// Loads the prior session's report, treating a missing or malformed
    /// file as "no prior report".
    ///
    /// Malformed data is logged and discarded rather than failing the new
    /// run; the new report will simply overwrite it at session end.
    pub async fn load_previous(path: &Path) -> Option<Self> {
        match Self::load(path).await {
            Ok(report) => Some(report),
            Err(Error::MalformedReport(message)) => {
                warn!(%message, "Discarding malformed proficiency report");
                None
            }
            Err(_) => {
                debug!(path = %path.display(), "No prior proficiency report");
                None
            }
        }
    }
}
