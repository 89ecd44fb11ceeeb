// ABOUTME: Append-only log of revision transitions per (cluster, service).
// ABOUTME: Contract plus the JSON-file backend used by the CLI.

mod file;

pub use file::{FileHistoryStore, default_state_dir};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded revision transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub revision: u64,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history log is corrupt: {0}")]
    Corrupt(String),

    /// The cluster or service name cannot form a log file name.
    #[error("invalid history key: {0}")]
    InvalidKey(String),
}

/// Deployment history, keyed by (cluster, service).
///
/// Entries are appended strictly after a promotion converges, so the log
/// never records a revision the service did not actually reach. Concurrent
/// appends for *different* services must be independent; same-service
/// appends are already serialized upstream by the single-in-flight
/// deployment check.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry for the service.
    async fn push_state(
        &self,
        cluster: &str,
        service: &str,
        revision: u64,
        message: &str,
    ) -> Result<(), HistoryError>;

    /// The most recently appended entry, if any. This is what a rollback
    /// flow uses to find a revision to redirect back to.
    async fn latest(&self, cluster: &str, service: &str)
    -> Result<Option<HistoryEntry>, HistoryError>;
}
