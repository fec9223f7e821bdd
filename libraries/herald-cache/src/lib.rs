//! Offline audio cache for Herald Audio.
//!
//! A persistent key-value store over SQLite, keyed by story id. Each record
//! holds display metadata plus either a binary audio payload (offline-ready)
//! or only a remote URL reference (the lesser state: listed, but not counted
//! as cached).
//!
//! Storage failures never cross this crate's boundary as errors: the public
//! API logs and degrades to `false` / `None` / empty so the playback and
//! download pipelines keep running when the cache is unavailable.

#![forbid(unsafe_code)]

mod error;
mod store;
mod types;

pub use error::{CacheError, Result};
pub use store::OfflineStore;
pub use types::{format_size, CacheRecord, CacheStats, CachedAudio, NewRecord};
