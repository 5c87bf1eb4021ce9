use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle states for a download attempt.
///
/// `Queued` is the only initial state. `Completed`, `Error` and `Cancelled`
/// are terminal for an attempt, but `Paused`, `Cancelled` and `Error` records
/// can be re-queued by an explicit resume under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Queued,
    Downloading,
    Paused,
    Completed,
    Error,
    Cancelled,
}

impl DownloadStatus {
    /// Terminal for the current attempt: no worker should be running it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Error | DownloadStatus::Cancelled
        )
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DownloadStatus::Queued => "queued",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Error => "error",
            DownloadStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The sole durable entity: one requested media download and its state.
///
/// `downloaded_bytes`, `total_bytes`, `speed` and `eta` are transient
/// telemetry overwritten on every progress tick; they are not meaningful
/// once the status leaves `Downloading`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub status: DownloadStatus,
    /// Percentage in [0, 100].
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub downloaded_bytes: u64,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    /// Bytes per second, as last reported by the engine.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Estimated seconds remaining.
    #[serde(default)]
    pub eta: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Fresh record in the sole initial state.
    pub fn new(id: String, url: String) -> Self {
        Self {
            id,
            url,
            title: None,
            filename: None,
            status: DownloadStatus::Queued,
            progress: 0.0,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: None,
            eta: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Left in a non-terminal state by an unclean shutdown: either it was
    /// actively transferring, or it was queued but had already made progress.
    pub fn is_interrupted(&self) -> bool {
        self.status == DownloadStatus::Downloading
            || (self.status == DownloadStatus::Queued && self.progress > 0.0)
    }
}
