//! Shared fixtures for the playback service integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::engine::{
    GroupTrack, PcmEncoding, RawAdaptationSet, RawPeriod, TrackFormat, TrackType,
};
use bridge_traits::{
    Artwork, ArtworkFetcher, BridgeError, EngineEvent, EngineEventSender, EngineFactory, EngineId,
    EngineMediaSource, EngineOptions, EnginePlaybackState, ListenerId, PlaybackEngine,
    RawManifest, SeekMode, TrackGroup,
};
use bytes::Bytes;
use core_runtime::events::{ControlEvent, EventStream};
use core_service::{LifecycleSnapshot, PlaybackHandle};
use parking_lot::Mutex;

// ============================================================================
// Engine
// ============================================================================

/// Engine double that records commands and lets the test push events.
///
/// Senders are kept after `remove_listener` so a test can simulate callbacks
/// that were already in flight when the engine was unbound.
pub struct FakeEngine {
    id: EngineId,
    senders: Mutex<Vec<EngineEventSender>>,
    removed: Mutex<Vec<ListenerId>>,
    next_listener: AtomicU64,
    calls: Mutex<Vec<String>>,
    sources: Mutex<Vec<EngineMediaSource>>,
    manifest_loaded: AtomicBool,
    released: AtomicBool,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: EngineId::next(),
            senders: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            sources: Mutex::new(Vec::new()),
            manifest_loaded: AtomicBool::new(false),
            released: AtomicBool::new(false),
        })
    }

    pub fn emit(&self, event: EngineEvent) {
        for sender in self.senders.lock().iter() {
            sender.send(event.clone());
        }
    }

    pub fn load_manifest(&self) {
        self.manifest_loaded.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.lock().iter().any(|call| call == name)
    }

    pub fn sources(&self) -> Vec<EngineMediaSource> {
        self.sources.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.senders.lock().len() - self.removed.lock().len()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

impl PlaybackEngine for FakeEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn add_listener(&self, sender: EngineEventSender) -> ListenerId {
        self.senders.lock().push(sender);
        ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst))
    }

    fn remove_listener(&self, listener: ListenerId) {
        self.removed.lock().push(listener);
    }

    fn set_media_source(&self, source: EngineMediaSource) -> bridge_traits::Result<()> {
        self.record("set_media_source");
        self.sources.lock().push(source);
        Ok(())
    }

    fn prepare(&self) {
        self.record("prepare");
    }

    fn play(&self) {
        self.record("play");
    }

    fn pause(&self) {
        self.record("pause");
    }

    fn stop(&self) {
        self.record("stop");
    }

    fn set_seek_mode(&self, _mode: SeekMode) {}

    fn seek_to(&self, position_ms: i64) {
        self.record(&format!("seek_to({position_ms})"));
    }

    fn current_position_ms(&self) -> i64 {
        42_000
    }

    fn duration_ms(&self) -> i64 {
        300_000
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn playback_state(&self) -> EnginePlaybackState {
        EnginePlaybackState::Idle
    }

    fn current_tracks(&self) -> Vec<TrackGroup> {
        hires_tracks()
    }

    fn current_manifest(&self) -> bridge_traits::Result<Option<RawManifest>> {
        if !self.manifest_loaded.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(RawManifest {
            periods: vec![RawPeriod {
                adaptation_sets: vec![RawAdaptationSet {
                    id: 0,
                    track_type: TrackType::Audio,
                    representation_count: 2,
                }],
            }],
            duration_ms: 300_000,
            dynamic: false,
        }))
    }

    fn release(&self) {
        self.record("release");
        self.released.store(true, Ordering::SeqCst);
    }
}

pub fn hires_tracks() -> Vec<TrackGroup> {
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

/// Hands out a fresh [`FakeEngine`] per call and keeps them for inspection.
#[derive(Default)]
pub struct FakeEngineFactory {
    created: Mutex<Vec<Arc<FakeEngine>>>,
}

impl FakeEngineFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last(&self) -> Arc<FakeEngine> {
        self.created
            .lock()
            .last()
            .cloned()
            .expect("no engine created yet")
    }
}

impl EngineFactory for FakeEngineFactory {
    fn create(&self, _options: &EngineOptions) -> bridge_traits::Result<Arc<dyn PlaybackEngine>> {
        let engine = FakeEngine::new();
        self.created.lock().push(Arc::clone(&engine));
        Ok(engine)
    }
}

// ============================================================================
// Artwork
// ============================================================================

/// Fetcher that serves a fixed image, or fails when built with `failing()`.
pub struct StaticArtwork {
    fail: bool,
    fetches: AtomicUsize,
}

impl StaticArtwork {
    pub fn serving() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtworkFetcher for StaticArtwork {
    async fn fetch(&self, reference: &str) -> bridge_traits::Result<Artwork> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BridgeError::OperationFailed("HTTP 404 Not Found".to_string()));
        }
        Ok(Artwork {
            reference: reference.to_string(),
            width: 512,
            height: 512,
            mime_type: "image/jpeg".to_string(),
            data: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
        })
    }
}

// ============================================================================
// Waiting helpers
// ============================================================================

const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Next event, failing the test if none arrives in time.
pub async fn next_event(events: &mut EventStream) -> ControlEvent {
    core_async::time::timeout(WAIT_LIMIT, events.recv())
        .await
        .expect("timed out waiting for a control event")
        .expect("event stream closed")
}

/// Skip events until one matches `pred`.
pub async fn event_matching(
    events: &mut EventStream,
    pred: impl Fn(&ControlEvent) -> bool,
) -> ControlEvent {
    loop {
        let event = next_event(events).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Poll lifecycle snapshots until `pred` holds.
pub async fn wait_for_snapshot(
    handle: &PlaybackHandle,
    pred: impl Fn(&LifecycleSnapshot) -> bool,
) -> LifecycleSnapshot {
    let deadline = core_async::Instant::now() + WAIT_LIMIT;
    loop {
        let snapshot = handle.snapshot().await.expect("service stopped");
        if pred(&snapshot) {
            return snapshot;
        }
        assert!(
            core_async::Instant::now() < deadline,
            "timed out waiting for lifecycle state, last: {snapshot:?}"
        );
        core_async::sleep(Duration::from_millis(5)).await;
    }
}
