//! The playback state machine
//!
//! Exclusive owner of the audio output. All transport calls and all audio
//! resource events funnel through `&mut self` methods, so state transitions
//! never race each other.

use std::sync::Arc;

use herald_cache::{CachedAudio, OfflineStore};
use herald_core::{
    AudioSource, BroadcastSettings, HistoryRecorder, PlayRecord, Track, TtsClient,
    MAX_SYNTHESIS_TEXT_LEN,
};
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::media::{EnabledCommands, MediaCommand, MediaControls, MediaMetadata, PositionState};
use crate::output::{AudioEvent, AudioOutput, PlayAttempt, ResolvedSource};
use crate::queue::PlayQueue;
use crate::types::{EngineConfig, PlayOutcome, PlaybackState, PlaybackStatus};
use crate::wake::WakeLock;

/// Single-active-track playback engine.
///
/// Owns the queue, the resolved state snapshot, and the platform seams
/// (audio output, media controls, wake lock). Collaborators that are
/// optional in a given host (offline cache, history recorder) are absent
/// until wired in with the `with_*` builders.
pub struct PlaybackEngine {
    output: Box<dyn AudioOutput>,
    tts: Arc<dyn TtsClient>,
    settings: Arc<dyn BroadcastSettings>,
    cache: Option<OfflineStore>,
    history: Option<Arc<dyn HistoryRecorder>>,
    media: Box<dyn MediaControls>,
    wake: Box<dyn WakeLock>,
    config: EngineConfig,
    state: PlaybackState,
    queue: PlayQueue,
    // Bumped on every load and stop; in-flight resolutions compare against it
    // and discard themselves when the player has moved on.
    load_generation: u64,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create an engine around a platform audio output.
    pub fn new(
        output: impl AudioOutput + 'static,
        tts: Arc<dyn TtsClient>,
        settings: Arc<dyn BroadcastSettings>,
        config: EngineConfig,
    ) -> Self {
        let mut output: Box<dyn AudioOutput> = Box::new(output);
        let volume = config.volume.clamp(0.0, 1.0);
        let rate = config.rate.clamp(0.5, 2.0);
        output.set_volume(volume);
        output.set_rate(rate);

        Self {
            output,
            tts,
            settings,
            cache: None,
            history: None,
            media: Box::new(crate::media::NoopMediaControls),
            wake: Box::new(crate::wake::NoopWakeLock),
            config,
            state: PlaybackState {
                volume,
                rate,
                ..PlaybackState::default()
            },
            queue: PlayQueue::new(),
            load_generation: 0,
            pending_events: Vec::new(),
        }
    }

    /// Attach an offline cache consulted before any network resolution.
    pub fn with_cache(mut self, cache: OfflineStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a fire-and-forget history recorder.
    pub fn with_history(mut self, history: Arc<dyn HistoryRecorder>) -> Self {
        self.history = Some(history);
        self
    }

    /// Attach a platform media-control surface.
    pub fn with_media_controls(mut self, media: impl MediaControls + 'static) -> Self {
        self.media = Box::new(media);
        self
    }

    /// Attach a platform wake lock.
    pub fn with_wake_lock(mut self, wake: impl WakeLock + 'static) -> Self {
        self.wake = Box::new(wake);
        self
    }

    /// Current state snapshot.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// The play queue.
    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    /// Drain the events buffered since the last call.
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ------------------------------------------------------------------
    // Play requests
    // ------------------------------------------------------------------

    /// Casual play request.
    ///
    /// Never steals focus: if a different track is already playing, the
    /// request is appended to the queue instead. A request for the currently
    /// loaded track toggles play/pause.
    pub async fn play_track(&mut self, track: Track) -> Result<PlayOutcome> {
        self.request_play(track, false).await
    }

    /// Deliberate play request; always replaces the current track.
    pub async fn force_play_track(&mut self, track: Track) -> Result<PlayOutcome> {
        self.request_play(track, true).await
    }

    async fn request_play(&mut self, track: Track, force: bool) -> Result<PlayOutcome> {
        let is_current = self
            .state
            .current_track
            .as_ref()
            .is_some_and(|t| t.id == track.id);

        if is_current
            && matches!(
                self.state.status,
                PlaybackStatus::Playing | PlaybackStatus::Paused | PlaybackStatus::Ended
            )
        {
            self.toggle_play()?;
            return Ok(PlayOutcome::Toggled);
        }

        if !force && self.state.status == PlaybackStatus::Playing {
            debug!(track_id = %track.id, "player busy, queueing track");
            let track_id = track.id.clone();
            if self.queue.add(track) {
                self.emit(PlaybackEvent::QueueChanged {
                    length: self.queue.len(),
                });
            }
            self.emit(PlaybackEvent::TrackQueued { track_id });
            self.sync_enabled_commands();
            return Ok(PlayOutcome::Queued);
        }

        self.load_and_play(track).await
    }

    /// Resolve a track's audio and hand it to the output.
    async fn load_and_play(&mut self, track: Track) -> Result<PlayOutcome> {
        self.load_generation += 1;
        let generation = self.load_generation;

        let previous_track_id = self.state.current_track.as_ref().map(|t| t.id.clone());

        // Keep the queue cursor pointing at the loaded track when it is a
        // queue member; external tracks leave the queue poised at the front.
        match self.queue.find_index(&track.id) {
            Some(index) => self.queue.set_current(index),
            None => self.queue.clear_current(),
        }

        self.state.current_track = Some(track.clone());
        self.state.position = 0.0;
        self.state.duration = 0.0;
        self.state.error = None;
        self.emit(PlaybackEvent::TrackChanged {
            track: Some(track.clone()),
            previous_track_id,
        });
        self.set_status(PlaybackStatus::Loading);
        self.publish_metadata(&track);
        self.sync_enabled_commands();

        let source = match self.resolve_source(&track).await {
            Ok(source) => source,
            Err(err) => {
                if generation != self.load_generation {
                    debug!(track_id = %track.id, "discarding superseded load failure");
                    return Ok(PlayOutcome::Superseded);
                }
                self.fail(err.to_string());
                return Err(err);
            }
        };

        if generation != self.load_generation {
            debug!(track_id = %track.id, "player moved on, discarding resolved source");
            return Ok(PlayOutcome::Superseded);
        }

        self.output.set_source(source);

        match self.output.play() {
            PlayAttempt::Started => {
                self.set_status(PlaybackStatus::Playing);
                self.record_history(&track);
                Ok(PlayOutcome::Started)
            }
            PlayAttempt::AutoplayBlocked => {
                debug!(track_id = %track.id, "autoplay blocked, waiting for a gesture");
                self.set_status(PlaybackStatus::Paused);
                Ok(PlayOutcome::Blocked)
            }
            PlayAttempt::Failed(message) => {
                self.fail(message.clone());
                Err(PlaybackError::PlaybackFailed(message))
            }
        }
    }

    /// Resolution priority: cached blob, then direct URL, then synthesis.
    async fn resolve_source(&self, track: &Track) -> Result<ResolvedSource> {
        if let Some(store) = &self.cache {
            match store.get(&track.id).await {
                Some(CachedAudio::Blob { bytes, .. }) => {
                    debug!(track_id = %track.id, "serving from offline cache");
                    return Ok(ResolvedSource::Cached(bytes));
                }
                Some(CachedAudio::Url { url, .. }) if track.audio.url().is_none() => {
                    // A previously synthesized URL saves a synthesis round-trip
                    debug!(track_id = %track.id, "reusing cached audio url");
                    return Ok(ResolvedSource::Remote(url));
                }
                _ => {}
            }
        }

        match &track.audio {
            AudioSource::Direct { url } => Ok(ResolvedSource::Remote(url.clone())),
            AudioSource::Synthesize { text } => {
                let text = truncate_chars(text, MAX_SYNTHESIS_TEXT_LEN);
                let voice = self.settings.voice_model();
                let language = self.settings.broadcast_language();
                let url = self
                    .tts
                    .synthesize(text, &voice, &language)
                    .await
                    .map_err(|e| PlaybackError::TtsGenerationFailed(e.to_string()))?;
                Ok(ResolvedSource::Remote(url))
            }
        }
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Toggle play/pause on the loaded track. No-op with nothing loaded.
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.state.current_track.is_none() {
            return Ok(());
        }

        match self.state.status {
            PlaybackStatus::Playing => {
                self.output.pause();
                self.set_status(PlaybackStatus::Paused);
                Ok(())
            }
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Ended => {
                // Replay from the top
                self.output.seek(0.0);
                self.state.position = 0.0;
                self.resume()
            }
            _ => Ok(()),
        }
    }

    fn resume(&mut self) -> Result<()> {
        match self.output.play() {
            PlayAttempt::Started => {
                self.set_status(PlaybackStatus::Playing);
                Ok(())
            }
            PlayAttempt::AutoplayBlocked => {
                // Still waiting for a gesture the platform accepts
                self.set_status(PlaybackStatus::Paused);
                Ok(())
            }
            PlayAttempt::Failed(message) => {
                self.fail(message.clone());
                Err(PlaybackError::PlaybackFailed(message))
            }
        }
    }

    /// Seek to an absolute position, clamped to the known duration.
    /// No-op with nothing loaded.
    pub fn seek(&mut self, position: f64) {
        if self.state.current_track.is_none() {
            return;
        }

        let clamped = position.clamp(0.0, self.state.duration.max(0.0));
        self.output.seek(clamped);
        self.state.position = clamped;
        self.emit(PlaybackEvent::PositionUpdate {
            position: clamped,
            duration: self.state.duration,
        });
        self.publish_position();
    }

    /// Unload the current track and return to idle. The queue survives,
    /// with its cursor cleared.
    pub fn stop_track(&mut self) {
        self.load_generation += 1;

        let previous_track_id = self.state.current_track.take().map(|t| t.id);
        self.output.clear_source();
        self.state.position = 0.0;
        self.state.duration = 0.0;
        self.state.error = None;
        self.queue.clear_current();

        if previous_track_id.is_some() {
            self.emit(PlaybackEvent::TrackChanged {
                track: None,
                previous_track_id,
            });
        }
        self.set_status(PlaybackStatus::Idle);
        self.media.clear();
        self.sync_enabled_commands();
    }

    /// Set output volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.output.set_volume(volume);
        if (self.state.volume - volume).abs() > f64::EPSILON {
            self.state.volume = volume;
            self.emit_state();
        }
    }

    /// Flip the mute flag without touching the volume setting.
    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.output.set_muted(self.state.muted);
        self.emit_state();
    }

    /// Set the playback rate, clamped to `0.5..=2.0`.
    pub fn set_playback_rate(&mut self, rate: f64) {
        let rate = rate.clamp(0.5, 2.0);
        self.output.set_rate(rate);
        if (self.state.rate - rate).abs() > f64::EPSILON {
            self.state.rate = rate;
            self.emit_state();
            self.publish_position();
        }
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Append a track to the queue. Duplicate ids are ignored.
    ///
    /// Adding the first item while nothing is loaded starts playback of it.
    pub async fn add_to_queue(&mut self, track: Track) -> bool {
        let was_empty = self.queue.is_empty();
        let track_id = track.id.clone();

        let added = self.queue.add(track);
        if !added {
            return false;
        }

        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
        self.sync_enabled_commands();

        if was_empty && self.state.current_track.is_none() {
            if let Some(index) = self.queue.find_index(&track_id) {
                if let Err(error) = self.play_from_queue(index).await {
                    warn!(error = %error, "first queued track failed to start");
                }
            }
        }

        true
    }

    /// Remove a queued track by id. The current track keeps playing even if
    /// its queue entry is removed.
    pub fn remove_from_queue(&mut self, track_id: &str) -> bool {
        let removed = self.queue.remove_by_id(track_id);
        if removed {
            self.emit(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
            self.sync_enabled_commands();
        }
        removed
    }

    /// Drop every queued track. Playback is unaffected.
    pub fn clear_queue(&mut self) {
        if !self.queue.is_empty() {
            self.queue.clear();
            self.emit(PlaybackEvent::QueueChanged { length: 0 });
            self.sync_enabled_commands();
        }
    }

    /// Move a queued track to a new position.
    pub fn reorder_queue(&mut self, from: usize, to: usize) -> bool {
        let changed = self.queue.reorder(from, to);
        if changed {
            self.emit(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
            self.sync_enabled_commands();
        }
        changed
    }

    /// Play the queued track at `index`. Returns `Ok(None)` when the index
    /// is out of range.
    pub async fn play_from_queue(&mut self, index: usize) -> Result<Option<PlayOutcome>> {
        let Some(track) = self.queue.get(index).cloned() else {
            return Ok(None);
        };
        self.load_and_play(track).await.map(Some)
    }

    /// Advance to the next queued track, if there is one.
    pub async fn play_next(&mut self) -> Result<Option<PlayOutcome>> {
        match self.queue.next_index() {
            Some(index) => self.play_from_queue(index).await,
            None => Ok(None),
        }
    }

    /// Step back to the previous queued track, if there is one.
    pub async fn play_prev(&mut self) -> Result<Option<PlayOutcome>> {
        match self.queue.prev_index() {
            Some(index) => self.play_from_queue(index).await,
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Inbound events
    // ------------------------------------------------------------------

    /// Feed an event from the platform audio resource into the state machine.
    pub async fn handle_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Play => self.set_status(PlaybackStatus::Playing),
            AudioEvent::Pause => {
                // Ignore pause echoes while loading or after the track ended
                if self.state.status == PlaybackStatus::Playing {
                    self.set_status(PlaybackStatus::Paused);
                }
            }
            AudioEvent::TimeUpdate { position } => {
                self.state.position = position;
                self.emit(PlaybackEvent::PositionUpdate {
                    position,
                    duration: self.state.duration,
                });
                self.publish_position();
            }
            AudioEvent::LoadedMetadata { duration } => {
                self.state.duration = duration;
                self.emit_state();
                self.publish_position();
            }
            AudioEvent::Ended => {
                self.state.position = self.state.duration;
                self.set_status(PlaybackStatus::Ended);

                if self.config.auto_advance {
                    if let Some(next) = self.queue.next_index() {
                        // Let the UI show the ended state before the switch
                        tokio::time::sleep(self.config.settle_delay).await;
                        if let Err(error) = self.play_from_queue(next).await {
                            warn!(error = %error, "auto-advance failed");
                        }
                    }
                }
            }
            AudioEvent::Error { message } => self.fail(message),
        }
    }

    /// Route a remote transport command from the platform media surface.
    pub async fn handle_media_command(&mut self, command: MediaCommand) -> Result<()> {
        match command {
            MediaCommand::Play => {
                if self.state.status != PlaybackStatus::Playing {
                    self.toggle_play()?;
                }
            }
            MediaCommand::Pause => {
                if self.state.status == PlaybackStatus::Playing {
                    self.toggle_play()?;
                }
            }
            MediaCommand::Stop => self.stop_track(),
            MediaCommand::SeekBy(delta) => self.seek(self.state.position + delta),
            MediaCommand::SeekTo(position) => self.seek(position),
            MediaCommand::Previous => {
                self.play_prev().await?;
            }
            MediaCommand::Next => {
                self.play_next().await?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.state.status == status {
            return;
        }
        self.state.status = status;

        let wake_result = if status == PlaybackStatus::Playing {
            self.wake.acquire()
        } else {
            self.wake.release()
        };
        if let Err(reason) = wake_result {
            debug!(reason = %reason, "wake lock unavailable");
        }

        self.emit_state();
    }

    fn fail(&mut self, message: String) {
        warn!(message = %message, "playback failure");
        self.state.error = Some(message.clone());
        self.emit(PlaybackEvent::Error { message });
        self.set_status(PlaybackStatus::Error);
    }

    fn record_history(&self, track: &Track) {
        let (Some(history), Some(user_id)) = (&self.history, &self.config.user_id) else {
            return;
        };

        let record = PlayRecord {
            user_id: user_id.clone(),
            track_id: track.id.clone(),
            title: track.title.clone(),
            source: track.source.clone(),
            category: track.category.clone(),
        };
        let history = Arc::clone(history);
        tokio::spawn(async move {
            if let Err(error) = history.record(record).await {
                warn!(error = %error, "history recording failed");
            }
        });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_state(&mut self) {
        self.pending_events
            .push(PlaybackEvent::StateChanged(self.state.clone()));
    }

    fn publish_metadata(&mut self, track: &Track) {
        self.media.set_metadata(&MediaMetadata {
            title: track.title.clone(),
            artist: track.source.clone(),
            artwork_url: None,
        });
    }

    fn publish_position(&mut self) {
        self.media.set_position_state(&PositionState {
            position: self.state.position,
            duration: self.state.duration,
            rate: self.state.rate,
        });
    }

    fn sync_enabled_commands(&mut self) {
        self.media.set_enabled(EnabledCommands {
            previous: self.queue.prev_index().is_some(),
            next: self.queue.next_index().is_some(),
        });
    }
}

/// Truncate on a character boundary without allocating.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
