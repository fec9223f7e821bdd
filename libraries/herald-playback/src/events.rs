//! Events emitted by the engine for the host UI
//!
//! The engine buffers events internally; the host drains them with
//! [`PlaybackEngine::take_events`](crate::PlaybackEngine::take_events) after
//! each call. Every event carries enough data to update a view without
//! re-querying the engine, though [`PlaybackEngine::state`](crate::PlaybackEngine::state)
//! is always available.

use herald_core::Track;

/// Notification emitted by the playback engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The playback state snapshot changed (status, track, volume, rate...)
    StateChanged(crate::types::PlaybackState),

    /// The current track changed
    TrackChanged {
        /// The track now loaded, if any
        track: Option<Track>,

        /// Id of the track that was current before
        previous_track_id: Option<String>,
    },

    /// A play request was deferred because something else was playing
    TrackQueued {
        /// Id of the queued track
        track_id: String,
    },

    /// The queue's contents or order changed
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Periodic position report while playing
    PositionUpdate {
        /// Position in seconds
        position: f64,

        /// Duration in seconds
        duration: f64,
    },

    /// A user-visible failure
    Error {
        /// Human-readable description
        message: String,
    },
}
