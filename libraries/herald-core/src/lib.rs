//! Herald Audio Core
//!
//! Shared domain types and boundary traits for the Herald broadcast engine.
//!
//! This crate defines:
//! - **Domain Types**: `Track`, `AudioSource`, `ContentKind`, `PlayRecord`
//! - **Boundary Traits**: `TtsClient`, `HistoryRecorder`, `BroadcastSettings`
//! - **Error Handling**: per-boundary error types
//!
//! A [`Track`] is a playable unit of news content (article narration, podcast
//! episode, daily briefing). Its audio source is resolved once at construction:
//! either a pre-resolved URL or text that still needs remote synthesis.
//!
//! # Example
//!
//! ```rust
//! use herald_core::{AudioSource, Track};
//!
//! // A track with a ready-to-play URL
//! let episode = Track::from_parts(
//!     "ep-120",
//!     "Morning Briefing",
//!     "The Daily Herald",
//!     Some("https://cdn.example.com/ep-120.mp3".into()),
//!     None,
//!     None,
//!     Some("news".into()),
//! );
//! assert!(matches!(episode.audio, AudioSource::Direct { .. }));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{HistoryError, TtsError};
pub use traits::{BroadcastSettings, HistoryRecorder, TtsClient};
pub use types::{AudioSource, ContentKind, PlayRecord, Track, MAX_SYNTHESIS_TEXT_LEN};
