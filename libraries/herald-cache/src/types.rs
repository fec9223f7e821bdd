//! Cache record and statistics types

use chrono::{DateTime, Utc};
use herald_core::ContentKind;
use serde::{Deserialize, Serialize};

/// Input for [`OfflineStore::put`](crate::OfflineStore::put).
///
/// `audio` is the binary payload; `None` stores a URL-only reference record,
/// which is listed but not offline-ready.
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// Cache key (= track id)
    pub story_id: String,

    /// Display title
    pub title: String,

    /// Publisher label
    pub source: String,

    /// Content type
    pub kind: ContentKind,

    /// Track duration in seconds, when known
    pub duration_secs: Option<f64>,

    /// Remote URL the audio came from (kept for URL-only records and
    /// diagnostics)
    pub audio_url: Option<String>,

    /// Binary audio payload
    pub audio: Option<Vec<u8>>,
}

/// A persisted cache entry, metadata only.
///
/// Returned by listing and as part of [`CachedAudio`]; never carries the blob
/// itself so enumerating a large cache stays cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Cache key (= track id)
    pub story_id: String,

    /// Display title
    pub title: String,

    /// Publisher label
    pub source: String,

    /// Content type
    pub kind: ContentKind,

    /// Track duration in seconds, when known
    pub duration_secs: Option<f64>,

    /// Remote URL, when stored
    pub audio_url: Option<String>,

    /// Stored payload size in bytes (0 for URL-only records)
    pub size_bytes: u64,

    /// True when a non-empty audio payload is stored
    pub offline_ready: bool,

    /// When the record was written
    pub cached_at: DateTime<Utc>,
}

/// Result of a cache lookup with the payload materialized.
#[derive(Debug, Clone)]
pub enum CachedAudio {
    /// Offline-ready: a freshly allocated, caller-owned copy of the payload
    Blob {
        /// Record metadata
        record: CacheRecord,
        /// Audio bytes
        bytes: Vec<u8>,
    },

    /// URL-only reference record
    Url {
        /// Record metadata
        record: CacheRecord,
        /// Remote audio URL
        url: String,
    },
}

impl CachedAudio {
    /// Record metadata for either variant.
    pub fn record(&self) -> &CacheRecord {
        match self {
            CachedAudio::Blob { record, .. } | CachedAudio::Url { record, .. } => record,
        }
    }

    /// Returns `true` if the payload is available locally.
    pub fn is_offline_ready(&self) -> bool {
        matches!(self, CachedAudio::Blob { .. })
    }
}

/// Aggregate cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of records, including URL-only references
    pub total_items: usize,

    /// Records with a stored payload
    pub offline_ready_count: usize,

    /// Sum of stored payload sizes
    pub total_size_bytes: u64,

    /// Human-readable form of `total_size_bytes`
    pub formatted_size: String,
}

/// Format a byte count as a human-readable string (1024 scaling).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
