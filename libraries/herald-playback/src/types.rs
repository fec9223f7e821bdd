//! Core types for the playback engine

use herald_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback status of the single global player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing loaded
    Idle,

    /// Resolving audio (cache lookup, TTS round-trip) or buffering
    Loading,

    /// Audio is playing
    Playing,

    /// Paused mid-track (also: loaded but blocked by autoplay policy)
    Paused,

    /// The current track finished naturally
    Ended,

    /// A user-visible failure; the engine stays usable and a retry is allowed
    Error,
}

/// Snapshot of the player state.
///
/// At most one track is current at any time. Transitions are driven only by
/// explicit API calls and the audio resource's own events, never by polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// The single current track, if any
    pub current_track: Option<Track>,

    /// Status of the state machine
    pub status: PlaybackStatus,

    /// Position in seconds
    pub position: f64,

    /// Duration in seconds (0 until the resource reports metadata)
    pub duration: f64,

    /// Volume in `[0, 1]`
    pub volume: f64,

    /// Whether output is muted
    pub muted: bool,

    /// Playback rate (`0.5..=2.0`)
    pub rate: f64,

    /// Human-readable message for the last user-visible failure
    pub error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            error: None,
        }
    }
}

/// Outcome of a play request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started
    Started,

    /// The request hit the currently loaded track; play/pause was toggled
    Toggled,

    /// Something else is playing; the track was appended to the queue
    Queued,

    /// Source loaded but the platform blocked autoplay; a user gesture
    /// (toggle_play) will start it. Not an error.
    Blocked,

    /// The player moved on while resolving; the late result was discarded
    Superseded,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Advance to the next queued track when the current one ends
    pub auto_advance: bool,

    /// Pause between a track ending and the next one loading, decoupling
    /// UI transition from audio teardown
    pub settle_delay: Duration,

    /// User to attribute history records to; recording is skipped without it
    pub user_id: Option<String>,

    /// Initial volume (0-1)
    pub volume: f64,

    /// Initial playback rate
    pub rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_advance: true,
            settle_delay: Duration::from_millis(300),
            user_id: None,
            volume: 1.0,
            rate: 1.0,
        }
    }
}
