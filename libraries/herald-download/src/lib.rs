//! Background download queue for Herald Audio.
//!
//! A strictly serial worker: at most one item is ever downloading, which keeps
//! bandwidth contention with live playback bounded and makes progress
//! reporting trivial. Items move `Pending -> Downloading -> Complete | Failed`
//! exactly once; a failed item is retried only by enqueueing it again.
//!
//! Completed payloads land in the [`herald_cache::OfflineStore`]; a single
//! item failing never affects the rest of the queue.

#![forbid(unsafe_code)]

mod error;
mod queue;
mod types;

pub use error::{DownloadError, Result};
pub use queue::DownloadQueue;
pub use types::{DownloadItem, DownloadRequest, DownloadStatus, QueueStats};
