//! Engine integration tests with a fake audio output.
//!
//! The fakes speak the same trait vocabulary as the platform implementations,
//! so these tests exercise the real state machine end to end: play requests,
//! the no-steal rule, queue auto-advance, synthesis, cache resolution, and
//! media command routing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use herald_cache::{NewRecord, OfflineStore};
use herald_core::{
    BroadcastSettings, ContentKind, HistoryRecorder, HistoryError, PlayRecord, Track, TtsClient,
    TtsError, MAX_SYNTHESIS_TEXT_LEN,
};
use herald_playback::{
    AudioEvent, AudioOutput, EngineConfig, MediaCommand, PlayAttempt, PlayOutcome, PlaybackEngine,
    PlaybackError, PlaybackEvent, PlaybackStatus, ResolvedSource,
};

// ----------------------------------------------------------------------
// Fakes
// ----------------------------------------------------------------------

#[derive(Default)]
struct OutputLog {
    sources: Vec<ResolvedSource>,
    play_results: VecDeque<PlayAttempt>,
    play_calls: usize,
    pause_calls: usize,
    seeks: Vec<f64>,
    cleared: usize,
    volume: f64,
    muted: bool,
    rate: f64,
}

/// Scriptable audio output. The test keeps a handle to the shared log.
#[derive(Clone)]
struct FakeOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl FakeOutput {
    fn new() -> (Self, Arc<Mutex<OutputLog>>) {
        let log = Arc::new(Mutex::new(OutputLog::default()));
        (Self { log: log.clone() }, log)
    }

    fn script_play(&self, result: PlayAttempt) {
        self.log.lock().unwrap().play_results.push_back(result);
    }
}

impl AudioOutput for FakeOutput {
    fn set_source(&mut self, source: ResolvedSource) {
        self.log.lock().unwrap().sources.push(source);
    }

    fn clear_source(&mut self) {
        self.log.lock().unwrap().cleared += 1;
    }

    fn play(&mut self) -> PlayAttempt {
        let mut log = self.log.lock().unwrap();
        log.play_calls += 1;
        log.play_results
            .pop_front()
            .unwrap_or(PlayAttempt::Started)
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().pause_calls += 1;
    }

    fn seek(&mut self, position: f64) {
        self.log.lock().unwrap().seeks.push(position);
    }

    fn set_volume(&mut self, volume: f64) {
        self.log.lock().unwrap().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.lock().unwrap().muted = muted;
    }

    fn set_rate(&mut self, rate: f64) {
        self.log.lock().unwrap().rate = rate;
    }
}

struct FakeTts {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeTts {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_text(&self) -> String {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TtsClient for FakeTts {
    async fn synthesize(
        &self,
        text: &str,
        _voice_id: &str,
        _language: &str,
    ) -> Result<String, TtsError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(TtsError::Service {
                status: 503,
                message: "voice model unavailable".into(),
            })
        } else {
            Ok("https://tts.example.com/generated.mp3".into())
        }
    }
}

struct FakeSettings;

impl BroadcastSettings for FakeSettings {
    fn voice_model(&self) -> String {
        "nova".into()
    }

    fn broadcast_language(&self) -> String {
        "en-US".into()
    }
}

#[derive(Default)]
struct FakeHistory {
    records: Mutex<Vec<PlayRecord>>,
}

#[async_trait]
impl HistoryRecorder for FakeHistory {
    async fn record(&self, record: PlayRecord) -> Result<(), HistoryError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn direct_track(id: &str, url: &str) -> Track {
    Track::from_parts(
        id,
        format!("Story {id}"),
        "The Daily Herald",
        Some(url.into()),
        None,
        None,
        Some("news".into()),
    )
}

fn narrated_track(id: &str, narrative: &str) -> Track {
    Track::from_parts(
        id,
        format!("Story {id}"),
        "The Daily Herald",
        None,
        Some(narrative.into()),
        None,
        None,
    )
}

fn engine_with(
    tts: Arc<FakeTts>,
    config: EngineConfig,
) -> (PlaybackEngine, Arc<Mutex<OutputLog>>, FakeOutput) {
    let (output, log) = FakeOutput::new();
    let engine = PlaybackEngine::new(output.clone(), tts, Arc::new(FakeSettings), config);
    (engine, log, output)
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        settle_delay: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

// ----------------------------------------------------------------------
// Resolution
// ----------------------------------------------------------------------

#[tokio::test]
async fn direct_url_plays_without_synthesis() {
    let tts = FakeTts::ok();
    let (mut engine, log, _) = engine_with(tts.clone(), fast_config());

    let outcome = engine
        .play_track(direct_track("a1", "https://cdn.example.com/a1.mp3"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(tts.call_count(), 0);
    assert_eq!(
        log.lock().unwrap().sources,
        vec![ResolvedSource::Remote(
            "https://cdn.example.com/a1.mp3".into()
        )]
    );
}

#[tokio::test]
async fn synthesis_is_called_exactly_once_with_truncated_text() {
    let tts = FakeTts::ok();
    let (mut engine, log, _) = engine_with(tts.clone(), fast_config());

    let long_narrative = "x".repeat(MAX_SYNTHESIS_TEXT_LEN + 1000);
    let outcome = engine
        .play_track(narrated_track("a2", &long_narrative))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(tts.call_count(), 1);
    assert_eq!(tts.last_text().chars().count(), MAX_SYNTHESIS_TEXT_LEN);
    assert_eq!(
        log.lock().unwrap().sources,
        vec![ResolvedSource::Remote(
            "https://tts.example.com/generated.mp3".into()
        )]
    );
}

#[tokio::test]
async fn cached_blob_wins_over_direct_url() {
    let store = OfflineStore::in_memory().await.unwrap();
    assert!(
        store
            .put(NewRecord {
                story_id: "a3".into(),
                title: "Story a3".into(),
                source: "The Daily Herald".into(),
                kind: ContentKind::Article,
                duration_secs: Some(90.0),
                audio_url: Some("https://cdn.example.com/a3.mp3".into()),
                audio: Some(vec![7, 8, 9]),
            })
            .await
    );

    let tts = FakeTts::ok();
    let (output, log) = FakeOutput::new();
    let mut engine = PlaybackEngine::new(output, tts.clone(), Arc::new(FakeSettings), fast_config())
        .with_cache(store);

    let outcome = engine
        .play_track(direct_track("a3", "https://cdn.example.com/a3.mp3"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(tts.call_count(), 0);
    assert_eq!(
        log.lock().unwrap().sources,
        vec![ResolvedSource::Cached(vec![7, 8, 9])]
    );
}

// ----------------------------------------------------------------------
// No-steal rule and toggling
// ----------------------------------------------------------------------

#[tokio::test]
async fn casual_play_never_steals_from_a_playing_track() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    let outcome = engine
        .play_track(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Queued);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");
    assert_eq!(engine.queue().len(), 1);
    assert!(engine
        .take_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::TrackQueued { track_id } if track_id == "b")));
}

#[tokio::test]
async fn force_play_always_replaces_the_current_track() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    let outcome = engine
        .force_play_track(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "b");
}

#[tokio::test]
async fn replaying_the_current_track_toggles_pause() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());
    let track = direct_track("a", "https://cdn.example.com/a.mp3");

    engine.play_track(track.clone()).await.unwrap();
    let outcome = engine.play_track(track.clone()).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled);
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
    assert_eq!(log.lock().unwrap().pause_calls, 1);

    let outcome = engine.play_track(track).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    // Only one source was ever loaded
    assert_eq!(log.lock().unwrap().sources.len(), 1);
}

// ----------------------------------------------------------------------
// Failure modes
// ----------------------------------------------------------------------

#[tokio::test]
async fn autoplay_block_is_not_an_error() {
    let (mut engine, _, output) = engine_with(FakeTts::ok(), fast_config());
    output.script_play(PlayAttempt::AutoplayBlocked);

    let outcome = engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::Blocked);
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
    assert!(engine.state().error.is_none());

    // A user gesture later starts the already-loaded source
    engine.toggle_play().unwrap();
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

#[tokio::test]
async fn synthesis_failure_sets_error_and_engine_stays_usable() {
    let tts = FakeTts::failing();
    let (mut engine, _, _) = engine_with(tts, fast_config());

    let result = engine.play_track(narrated_track("a", "some narrative")).await;
    assert!(matches!(result, Err(PlaybackError::TtsGenerationFailed(_))));
    assert_eq!(engine.state().status, PlaybackStatus::Error);
    assert!(engine.state().error.is_some());

    // A subsequent request recovers without rebuilding the engine
    let outcome = engine
        .force_play_track(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert!(engine.state().error.is_none());
}

#[tokio::test]
async fn resource_error_event_surfaces_as_error_state() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());
    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();

    engine
        .handle_event(AudioEvent::Error {
            message: "decode failed".into(),
        })
        .await;

    assert_eq!(engine.state().status, PlaybackStatus::Error);
    assert_eq!(engine.state().error.as_deref(), Some("decode failed"));
}

// ----------------------------------------------------------------------
// Queue and auto-advance
// ----------------------------------------------------------------------

#[tokio::test]
async fn ended_track_auto_advances_to_the_queued_one() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;

    engine.handle_event(AudioEvent::Ended).await;

    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "b");
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

#[tokio::test]
async fn first_queued_track_starts_playback() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .add_to_queue(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await;

    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");

    // A second add while playing only queues
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");
    assert_eq!(engine.queue().len(), 2);
}

#[tokio::test]
async fn queue_dedup_keeps_a_single_entry() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());
    let track = direct_track("a", "https://cdn.example.com/a.mp3");

    assert!(engine.add_to_queue(track.clone()).await);
    assert!(!engine.add_to_queue(track).await);

    assert_eq!(engine.queue().len(), 1);
}

#[tokio::test]
async fn ended_with_empty_queue_stays_ended() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());
    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    engine
        .handle_event(AudioEvent::LoadedMetadata { duration: 120.0 })
        .await;

    engine.handle_event(AudioEvent::Ended).await;

    assert_eq!(engine.state().status, PlaybackStatus::Ended);
    assert_eq!(engine.state().position, 120.0);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");
}

#[tokio::test]
async fn tracks_queued_by_the_no_steal_rule_get_their_turn() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    // Queued, not played: "a" keeps focus
    engine
        .play_track(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();

    engine.handle_event(AudioEvent::Ended).await;

    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "b");
}

#[tokio::test]
async fn auto_advance_can_be_disabled() {
    let config = EngineConfig {
        auto_advance: false,
        ..fast_config()
    };
    let (mut engine, _, _) = engine_with(FakeTts::ok(), config);

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;

    engine.handle_event(AudioEvent::Ended).await;

    assert_eq!(engine.state().status, PlaybackStatus::Ended);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");
}

#[tokio::test]
async fn removing_the_current_queue_entry_does_not_stop_playback() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    // First add starts playback of "a"; "b" joins the queue behind it
    engine
        .add_to_queue(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await;
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;
    assert_eq!(engine.state().status, PlaybackStatus::Playing);

    assert!(engine.remove_from_queue("a"));

    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");
    assert_eq!(engine.queue().len(), 1);
}

// ----------------------------------------------------------------------
// Transport
// ----------------------------------------------------------------------

#[tokio::test]
async fn seek_clamps_to_the_known_duration() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());
    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    engine
        .handle_event(AudioEvent::LoadedMetadata { duration: 100.0 })
        .await;

    engine.seek(500.0);
    assert_eq!(engine.state().position, 100.0);

    engine.seek(-10.0);
    assert_eq!(engine.state().position, 0.0);

    assert_eq!(log.lock().unwrap().seeks, vec![100.0, 0.0]);
}

#[tokio::test]
async fn seek_with_nothing_loaded_is_a_no_op() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());

    engine.seek(30.0);

    assert!(log.lock().unwrap().seeks.is_empty());
    assert_eq!(engine.state().position, 0.0);
}

#[tokio::test]
async fn stop_resets_playback_but_keeps_the_queue() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());
    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;

    engine.stop_track();

    assert_eq!(engine.state().status, PlaybackStatus::Idle);
    assert!(engine.state().current_track.is_none());
    assert_eq!(engine.state().position, 0.0);
    assert_eq!(engine.queue().len(), 1);
    assert_eq!(log.lock().unwrap().cleared, 1);
}

#[tokio::test]
async fn volume_and_rate_are_clamped() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());

    engine.set_volume(1.5);
    assert_eq!(engine.state().volume, 1.0);
    engine.set_volume(-0.2);
    assert_eq!(engine.state().volume, 0.0);

    engine.set_playback_rate(5.0);
    assert_eq!(engine.state().rate, 2.0);
    engine.set_playback_rate(0.1);
    assert_eq!(engine.state().rate, 0.5);

    let log = log.lock().unwrap();
    assert_eq!(log.volume, 0.0);
    assert_eq!(log.rate, 0.5);
}

#[tokio::test]
async fn mute_toggles_without_touching_volume() {
    let (mut engine, log, _) = engine_with(FakeTts::ok(), fast_config());
    engine.set_volume(0.7);

    engine.toggle_mute();
    assert!(engine.state().muted);
    assert_eq!(engine.state().volume, 0.7);
    assert!(log.lock().unwrap().muted);

    engine.toggle_mute();
    assert!(!engine.state().muted);
}

// ----------------------------------------------------------------------
// Media commands and history
// ----------------------------------------------------------------------

#[tokio::test]
async fn media_commands_drive_the_transport() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());
    // First add starts "a"; "b" waits behind it
    engine
        .add_to_queue(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await;
    engine
        .add_to_queue(direct_track("b", "https://cdn.example.com/b.mp3"))
        .await;
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");

    engine.handle_media_command(MediaCommand::Next).await.unwrap();
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "b");

    engine
        .handle_media_command(MediaCommand::Previous)
        .await
        .unwrap();
    assert_eq!(engine.state().current_track.as_ref().unwrap().id, "a");

    engine
        .handle_media_command(MediaCommand::Pause)
        .await
        .unwrap();
    assert_eq!(engine.state().status, PlaybackStatus::Paused);

    engine
        .handle_media_command(MediaCommand::Play)
        .await
        .unwrap();
    assert_eq!(engine.state().status, PlaybackStatus::Playing);

    engine
        .handle_event(AudioEvent::LoadedMetadata { duration: 60.0 })
        .await;
    engine
        .handle_media_command(MediaCommand::SeekTo(30.0))
        .await
        .unwrap();
    assert_eq!(engine.state().position, 30.0);
    engine
        .handle_media_command(MediaCommand::SeekBy(-10.0))
        .await
        .unwrap();
    assert_eq!(engine.state().position, 20.0);

    engine.handle_media_command(MediaCommand::Stop).await.unwrap();
    assert_eq!(engine.state().status, PlaybackStatus::Idle);
}

#[tokio::test]
async fn history_is_recorded_once_per_started_track() {
    let history = Arc::new(FakeHistory::default());
    let config = EngineConfig {
        user_id: Some("user-42".into()),
        ..fast_config()
    };
    let (output, _) = FakeOutput::new();
    let mut engine = PlaybackEngine::new(output, FakeTts::ok(), Arc::new(FakeSettings), config)
        .with_history(history.clone());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    // Pause toggle must not record again
    engine.toggle_play().unwrap();
    engine.toggle_play().unwrap();

    // Recording is fire-and-forget on a spawned task
    tokio::time::sleep(Duration::from_millis(20)).await;

    let records = history.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, "a");
    assert_eq!(records[0].user_id, "user-42");
}

#[tokio::test]
async fn events_report_track_and_state_changes() {
    let (mut engine, _, _) = engine_with(FakeTts::ok(), fast_config());

    engine
        .play_track(direct_track("a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    let events = engine.take_events();

    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::TrackChanged { track: Some(t), .. } if t.id == "a"
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::StateChanged(s) if s.status == PlaybackStatus::Playing)));

    // Draining leaves the buffer empty
    assert!(engine.take_events().is_empty());
}
