//! Herald Audio - Playback Engine
//!
//! Owns the single audio output resource and everything around it:
//!
//! - Transport controls (play/pause/seek/stop/rate/volume)
//! - Track resolution: cached blob, direct URL, or on-demand TTS synthesis
//! - An ordered play queue with de-duplication and auto-advance
//! - Platform media-control sync (lock-screen transport) and wake lock
//!
//! # Architecture
//!
//! The engine is platform-agnostic. The actual audio element lives behind the
//! [`AudioOutput`] trait, and the platform feeds its events (`play`, `pause`,
//! `timeupdate`, `loadedmetadata`, `ended`, `error`) back through
//! [`PlaybackEngine::handle_event`]. That makes the whole state machine
//! testable with a fake output that speaks the same event vocabulary.
//!
//! The core UX contract: a casual `play_track` never steals focus from a
//! track that is already playing. The new track is appended to the queue
//! instead; only `force_play_track` (or queue auto-advance) changes the
//! current track.
//!
//! # Example
//!
//! ```ignore
//! use herald_playback::{EngineConfig, PlaybackEngine, PlayOutcome};
//!
//! let mut engine = PlaybackEngine::new(output, tts, settings, EngineConfig::default());
//!
//! // Plays immediately: nothing else is active
//! engine.force_play_track(morning_briefing).await?;
//!
//! // Already playing, so this one is queued instead
//! let outcome = engine.play_track(next_story).await?;
//! assert_eq!(outcome, PlayOutcome::Queued);
//! ```

#![forbid(unsafe_code)]

mod engine;
mod error;
mod events;
mod media;
mod output;
mod queue;
pub mod types;
mod wake;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use media::{
    EnabledCommands, MediaCommand, MediaControls, MediaMetadata, NoopMediaControls, PositionState,
};
pub use output::{AudioEvent, AudioOutput, PlayAttempt, ResolvedSource};
pub use queue::PlayQueue;
pub use types::{EngineConfig, PlayOutcome, PlaybackState, PlaybackStatus};
pub use wake::{NoopWakeLock, WakeLock};
