//! Audio output seam
//!
//! The engine never touches a platform audio element directly. The platform
//! implements [`AudioOutput`] and forwards the element's events through
//! [`PlaybackEngine::handle_event`](crate::PlaybackEngine::handle_event);
//! tests inject a fake that speaks the same vocabulary.

/// A resolved, ready-to-play audio source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Remote URL (direct track URL or a freshly synthesized one)
    Remote(String),

    /// Caller-owned bytes materialized from the offline cache
    Cached(Vec<u8>),
}

impl ResolvedSource {
    /// URL of the source, when it has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            ResolvedSource::Remote(url) => Some(url),
            ResolvedSource::Cached(_) => None,
        }
    }
}

/// Result of asking the platform to start playback.
///
/// Autoplay rejection is an expected, non-fatal condition: the source stays
/// loaded and a later user-gesture play will succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayAttempt {
    /// Audio is rolling
    Started,

    /// Platform autoplay policy refused; source remains loaded
    AutoplayBlocked,

    /// Genuine failure (decode, device, network)
    Failed(String),
}

/// Events emitted by the platform audio resource.
///
/// This is the complete event vocabulary the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Playback started or resumed
    Play,

    /// Playback paused
    Pause,

    /// Periodic position report (seconds)
    TimeUpdate {
        /// Current position in seconds
        position: f64,
    },

    /// Stream metadata became available
    LoadedMetadata {
        /// Total duration in seconds
        duration: f64,
    },

    /// The current track finished naturally
    Ended,

    /// The resource failed (decode error, network drop)
    Error {
        /// Platform error description
        message: String,
    },
}

/// Platform audio element abstraction.
///
/// Exclusively owned by the playback engine; no other component writes to it.
/// All methods are synchronous and non-blocking; completion and failure are
/// reported via [`AudioEvent`]s.
pub trait AudioOutput: Send {
    /// Load a new source, replacing any previous one.
    fn set_source(&mut self, source: ResolvedSource);

    /// Drop the current source and stop any output.
    fn clear_source(&mut self);

    /// Attempt to start playback of the loaded source.
    fn play(&mut self) -> PlayAttempt;

    /// Pause playback, keeping the source and position.
    fn pause(&mut self);

    /// Jump to an absolute position in seconds.
    fn seek(&mut self, position: f64);

    /// Set output volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    /// Mute or unmute without changing the volume setting.
    fn set_muted(&mut self, muted: bool);

    /// Set the playback rate.
    fn set_rate(&mut self, rate: f64);
}
