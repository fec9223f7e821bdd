//! Download queue item and statistics types

use chrono::{DateTime, Utc};
use herald_core::ContentKind;
use serde::{Deserialize, Serialize};

/// A request to persist one track for offline listening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Track id, used as the cache key
    pub story_id: String,

    /// Remote audio URL to fetch
    pub audio_url: String,

    /// Display title
    pub title: String,

    /// Publisher label
    pub source: String,

    /// Content type
    pub kind: ContentKind,

    /// Track duration in seconds, when known
    pub duration_secs: Option<f64>,
}

/// Lifecycle state of a queued download.
///
/// Transitions `Pending -> Downloading -> Complete | Failed`, each at most
/// once per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    /// Waiting for the worker
    Pending,

    /// Currently streaming (at most one item at a time)
    Downloading,

    /// Payload stored in the offline cache
    Complete,

    /// Fetch or store failed; requires a fresh enqueue to retry
    Failed,
}

impl DownloadStatus {
    /// Returns `true` for `Complete` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadStatus::Complete | DownloadStatus::Failed)
    }
}

/// A queued download with its live status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Originating request
    pub request: DownloadRequest,

    /// Current lifecycle state
    pub status: DownloadStatus,

    /// 0..=100; stays at 0 while streaming a body of unknown length
    pub progress: u8,

    /// When the item was enqueued (ordering and diagnostics)
    pub added_at: DateTime<Utc>,
}

impl DownloadItem {
    pub(crate) fn new(request: DownloadRequest) -> Self {
        Self {
            request,
            status: DownloadStatus::Pending,
            progress: 0,
            added_at: Utc::now(),
        }
    }
}

/// Aggregate queue state for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Items waiting for the worker
    pub pending: usize,

    /// Items currently streaming (0 or 1)
    pub downloading: usize,

    /// Items stored successfully
    pub completed: usize,

    /// Items that failed
    pub failed: usize,

    /// Total items currently tracked
    pub total: usize,

    /// `round(completed / total * 100)`, 0 for an empty queue
    pub overall_progress: u8,
}
