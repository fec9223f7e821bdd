//! Error types for the playback engine

use thiserror::Error;

/// Playback errors surfaced to callers.
///
/// Only the genuinely recoverable, user-visible conditions arrive as `Err`:
/// autoplay rejection is reported as [`PlayOutcome::Blocked`] and the no-audio
/// no-ops never error at all, but the variants are part of the taxonomy for
/// hosts that want to match on them.
///
/// [`PlayOutcome::Blocked`]: crate::types::PlayOutcome::Blocked
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The synthesis service could not produce audio for this track
    #[error("Audio generation failed: {0}")]
    TtsGenerationFailed(String),

    /// The platform rejected autoplay; the source is loaded and ready,
    /// only a user gesture is needed
    #[error("Playback rejected by autoplay policy")]
    PlaybackRejected,

    /// A genuine decode or network failure from the audio resource
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Transport operation with nothing loaded
    #[error("No audio loaded")]
    AudioUnavailable,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
