//! Adapter + bridge driven by a scripted engine, the way the command task
//! uses them.

use std::sync::Arc;

use bridge_traits::engine::{
    EngineEventSender, GroupTrack, ListenerId, PcmEncoding, RawAdaptationSet, RawManifest,
    RawPeriod, SeekMode, TimelineChangeReason, TrackFormat, TrackType,
};
use bridge_traits::{
    EngineEvent, EngineFactory, EngineId, EngineMediaSource, EngineOptions, EnginePlaybackState,
    HttpSourceConfig, PlaybackEngine, TrackGroup,
};
use core_playback::{EngineAdapter, EngineBinder, EventBridge, SourceResolver};
use core_runtime::events::{ControlEvent, EventDispatcher};
use parking_lot::Mutex;

#[derive(Default)]
struct Recorded {
    sources: Vec<EngineMediaSource>,
    seeks: Vec<(SeekMode, i64)>,
    state: Option<EnginePlaybackState>,
}

struct ScriptedEngine {
    id: EngineId,
    recorded: Mutex<Recorded>,
    pending_seek_mode: Mutex<SeekMode>,
}

impl ScriptedEngine {
    fn new() -> Self {
        Self {
            id: EngineId::next(),
            recorded: Mutex::new(Recorded::default()),
            pending_seek_mode: Mutex::new(SeekMode::ClosestSync),
        }
    }
}

fn hires_tracks() -> Vec<TrackGroup> {
    vec![TrackGroup {
        track_type: TrackType::Audio,
        selected: true,
        tracks: vec![GroupTrack {
            format: TrackFormat {
                sample_mime_type: Some("audio/flac".to_string()),
                sample_rate: Some(96_000),
                channel_count: Some(2),
                pcm_encoding: Some(PcmEncoding::Pcm24),
                ..Default::default()
            },
            selected: true,
        }],
    }]
}

impl PlaybackEngine for ScriptedEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn add_listener(&self, _sender: EngineEventSender) -> ListenerId {
        ListenerId(1)
    }

    fn remove_listener(&self, _listener: ListenerId) {}

    fn set_media_source(&self, source: EngineMediaSource) -> bridge_traits::Result<()> {
        self.recorded.lock().sources.push(source);
        Ok(())
    }

    fn prepare(&self) {
        self.recorded.lock().state = Some(EnginePlaybackState::Buffering);
    }

    fn play(&self) {}

    fn pause(&self) {}

    fn stop(&self) {}

    fn set_seek_mode(&self, mode: SeekMode) {
        *self.pending_seek_mode.lock() = mode;
    }

    fn seek_to(&self, position_ms: i64) {
        let mode = *self.pending_seek_mode.lock();
        self.recorded.lock().seeks.push((mode, position_ms));
    }

    fn current_position_ms(&self) -> i64 {
        0
    }

    fn duration_ms(&self) -> i64 {
        bridge_traits::TIME_UNSET
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn playback_state(&self) -> EnginePlaybackState {
        self.recorded
            .lock()
            .state
            .unwrap_or(EnginePlaybackState::Idle)
    }

    fn current_tracks(&self) -> Vec<TrackGroup> {
        hires_tracks()
    }

    fn current_manifest(&self) -> bridge_traits::Result<Option<RawManifest>> {
        Ok(Some(RawManifest {
            periods: vec![RawPeriod {
                adaptation_sets: vec![RawAdaptationSet {
                    id: 0,
                    track_type: TrackType::Audio,
                    representation_count: 3,
                }],
            }],
            duration_ms: 300_000,
            dynamic: false,
        }))
    }

    fn release(&self) {}
}

struct SingleEngineFactory(Arc<ScriptedEngine>);

impl EngineFactory for SingleEngineFactory {
    fn create(&self, _options: &EngineOptions) -> bridge_traits::Result<Arc<dyn PlaybackEngine>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct Session {
    engine: Option<Arc<dyn PlaybackEngine>>,
}

impl EngineBinder for Session {
    fn bind_engine(&mut self, engine: Arc<dyn PlaybackEngine>) {
        self.engine = Some(engine);
    }
}

#[test]
fn test_dash_source_through_first_ready() {
    let engine = Arc::new(ScriptedEngine::new());
    let mut adapter = EngineAdapter::new(
        Arc::new(SingleEngineFactory(engine.clone())),
        EngineOptions::default(),
        HttpSourceConfig::default(),
    );
    let dispatcher = EventDispatcher::new();
    let mut stream = dispatcher.attach();
    let mut bridge = EventBridge::new(dispatcher);
    let mut session = Session::default();

    let descriptor = SourceResolver::default()
        .resolve("https://cdn.example/album/stream.mpd")
        .unwrap();
    adapter.set_source(descriptor, &mut session).unwrap();
    assert!(session.engine.is_some());

    // Seek while still preparing; applied by the engine later.
    adapter.seek_to(30_000).unwrap();

    bridge.handle(
        EngineEvent::PlaybackStateChanged(EnginePlaybackState::Buffering),
        &mut adapter,
    );
    bridge.handle(EngineEvent::IsPlayingChanged(true), &mut adapter);
    bridge.handle(
        EngineEvent::TimelineChanged {
            window_count: 1,
            reason: TimelineChangeReason::PlaylistChanged,
        },
        &mut adapter,
    );
    bridge.handle(
        EngineEvent::PlaybackStateChanged(EnginePlaybackState::Ready),
        &mut adapter,
    );

    let mut events = Vec::new();
    while let Some(event) = stream.try_recv() {
        events.push(event);
    }
    let names: Vec<_> = events.iter().map(ControlEvent::name).collect();
    assert_eq!(
        names,
        vec![
            "playback_state_changed",
            "timeline_changed",
            "playback_state_changed",
            "tracks_changed",
            "is_playing_changed",
        ]
    );
    assert_eq!(
        events[3],
        ControlEvent::TracksChanged {
            sample_rate: Some(96_000),
            bit_depth: Some(24),
            channels: Some(2),
            codec: Some("FLAC".to_string()),
            tier: Some("hi_res_96".to_string()),
        }
    );

    let recorded = engine.recorded.lock();
    assert_eq!(recorded.sources.len(), 1);
    assert_eq!(recorded.seeks, vec![(SeekMode::Exact, 30_000)]);
    drop(recorded);

    let manifest = adapter.manifest_info().unwrap();
    assert_eq!(manifest.period_count, 1);
    assert_eq!(manifest.duration_ms, 300_000);
    assert_eq!(adapter.duration(), 0);
}

#[test]
fn test_invalid_reference_never_reaches_engine() {
    let engine = Arc::new(ScriptedEngine::new());
    let resolver = SourceResolver::default();

    let err = resolver.resolve("   ").unwrap_err();
    assert_eq!(err.code(), "INVALID_SOURCE");
    assert!(engine.recorded.lock().sources.is_empty());
}
