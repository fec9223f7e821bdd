//! Boundary traits consumed by the engine
//!
//! These are the seams to collaborators the core does not own: the remote
//! synthesis service, the listening-history recorder, and the preferences
//! provider. Each has a production implementation elsewhere in the workspace
//! or in the host application, and a fake in the engine's tests.

use crate::error::{HistoryError, TtsError};
use crate::types::PlayRecord;
use async_trait::async_trait;

/// Remote text-to-speech acquisition.
///
/// A stateless async call: text plus voice and language in, playable URL out.
/// Failure is any non-success response or network error; the playback engine
/// maps it to a user-visible error state.
#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Synthesize `text` and return a playable audio URL.
    ///
    /// `text` is expected to already be truncated to
    /// [`MAX_SYNTHESIS_TEXT_LEN`](crate::types::MAX_SYNTHESIS_TEXT_LEN).
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        language: &str,
    ) -> Result<String, TtsError>;
}

/// Fire-and-forget listening-history recorder.
///
/// The engine spawns the call and ignores the outcome; failures must never
/// affect playback state.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    /// Record that a track started playing.
    async fn record(&self, record: PlayRecord) -> Result<(), HistoryError>;
}

/// Read-only access to the active broadcast preferences.
///
/// The engine never persists settings; it only reads the current voice and
/// language when it needs to synthesize.
pub trait BroadcastSettings: Send + Sync {
    /// Identifier of the active synthesis voice.
    fn voice_model(&self) -> String;

    /// BCP 47 language tag for synthesis.
    fn broadcast_language(&self) -> String;
}
