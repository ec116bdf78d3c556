//! Run reports and anomaly collection.
//!
//! Every sync run produces one [`RunReport`]: counts per pipeline stage,
//! per-batch outcomes, and every anomaly observed along the way. Nothing
//! is swallowed; malformed records, duplicate keys, and timestamp ties all
//! land here for the operator to review.
//!
//! Reports persist to `~/.sharesync/last_run.json` so `ssync report` can
//! show the most recent run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ApplyKind, Side};

/// What kind of anomaly was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A record missing one or more natural-key fields; excluded from the
    /// run.
    MalformedRecord,
    /// Two records on one side with the same natural key; the last seen
    /// one won the match.
    DuplicateKey,
    /// Equal timestamps with differing payloads; no mutation was planned.
    TieConflict,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRecord => write!(f, "malformed record"),
            Self::DuplicateKey => write!(f, "duplicate key"),
            Self::TieConflict => write!(f, "tie conflict"),
        }
    }
}

/// One reported anomaly. The run continues past all of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    /// Side the anomaly was observed on. `None` for ties, which involve
    /// both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Natural key of the affected entity, when one could be extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub detail: String,
}

/// Outcome of one apply batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub side: Side,
    pub kind: ApplyKind,
    /// Records handed to the backend.
    pub attempted: usize,
    /// Records the backend confirmed applied.
    pub applied: usize,
    /// Batch-level failure, if any. Other batches still ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Natural keys carried by a failed batch, for operator follow-up.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_keys: Vec<String>,
}

impl BatchOutcome {
    /// An empty batch that never touched the network.
    #[must_use]
    pub const fn skipped(side: Side, kind: ApplyKind) -> Self {
        Self {
            side,
            kind,
            attempted: 0,
            applied: 0,
            error: None,
            failed_keys: Vec::new(),
        }
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The full record of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Whether the plan was only printed, not executed.
    pub dry_run: bool,

    /// Records fetched (before normalization) per side.
    pub fetched_list: usize,
    pub fetched_docs: usize,

    /// Matcher output sizes.
    pub matched: usize,
    pub only_list: usize,
    pub only_docs: usize,

    /// Disposition counts over matched pairs.
    pub unchanged: usize,
    pub newer_on_list: usize,
    pub newer_on_docs: usize,
    pub ties: usize,

    pub batches: Vec<BatchOutcome>,
    pub anomalies: Vec<Anomaly>,
}

impl RunReport {
    /// Fresh report skeleton for a run starting now.
    #[must_use]
    pub fn begin(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            id: format!("run_{}", &uuid::Uuid::new_v4().to_string()[..12]),
            started_at: now,
            finished_at: now,
            dry_run,
            fetched_list: 0,
            fetched_docs: 0,
            matched: 0,
            only_list: 0,
            only_docs: 0,
            unchanged: 0,
            newer_on_list: 0,
            newer_on_docs: 0,
            ties: 0,
            batches: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// True when every batch succeeded.
    #[must_use]
    pub fn all_batches_succeeded(&self) -> bool {
        self.batches.iter().all(BatchOutcome::succeeded)
    }

    /// Total records the plan carried.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.batches.iter().map(|b| b.attempted).sum()
    }

    /// Persist this report as the most recent run.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("last_run.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load the most recent persisted report.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoReport` if no report has been saved yet.
    pub fn load_last(dir: &Path) -> Result<Self> {
        let path = dir.join("last_run.json");
        if !path.exists() {
            return Err(Error::NoReport);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
