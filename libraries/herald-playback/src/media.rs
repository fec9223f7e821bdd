//! Platform media-control surface (lock-screen / OS transport)
//!
//! The engine publishes metadata and position state whenever they change and
//! keeps the enabled command set in sync with the queue. Remote commands
//! travel the other way via
//! [`PlaybackEngine::handle_media_command`](crate::PlaybackEngine::handle_media_command).
//! Platforms without such a surface plug in [`NoopMediaControls`].

use serde::{Deserialize, Serialize};

/// Now-playing metadata published to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Track title
    pub title: String,

    /// Publisher label (shown as the artist)
    pub artist: String,

    /// Optional artwork URL
    pub artwork_url: Option<String>,
}

/// Transport position published to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// Position in seconds
    pub position: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Playback rate
    pub rate: f64,
}

/// Which optional remote commands are currently meaningful.
///
/// Prev/next are disabled at queue boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnabledCommands {
    /// "Previous track" is available
    pub previous: bool,

    /// "Next track" is available
    pub next: bool,
}

/// Remote transport command arriving from the platform surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Stop and unload
    Stop,

    /// Seek relative to the current position (seconds, may be negative)
    SeekBy(f64),

    /// Seek to an absolute position (seconds)
    SeekTo(f64),

    /// Jump to the previous queue item
    Previous,

    /// Jump to the next queue item
    Next,
}

/// Platform media-control abstraction.
///
/// Every method is best-effort; implementations must not fail loudly when the
/// platform surface is missing or restricted.
pub trait MediaControls: Send {
    /// Publish now-playing metadata.
    fn set_metadata(&mut self, metadata: &MediaMetadata);

    /// Publish transport position.
    fn set_position_state(&mut self, state: &PositionState);

    /// Update which optional commands are enabled.
    fn set_enabled(&mut self, commands: EnabledCommands);

    /// Clear the now-playing surface entirely.
    fn clear(&mut self);
}

/// No-op implementation for platforms without a media-control surface.
pub struct NoopMediaControls;

impl MediaControls for NoopMediaControls {
    fn set_metadata(&mut self, _metadata: &MediaMetadata) {}
    fn set_position_state(&mut self, _state: &PositionState) {}
    fn set_enabled(&mut self, _commands: EnabledCommands) {}
    fn clear(&mut self) {}
}
