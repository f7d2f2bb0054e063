//! Playback engine capability.
//!
//! The core never decodes or renders audio itself. It drives a host-provided
//! engine (ExoPlayer on Android, AVPlayer on iOS, a GStreamer pipeline on
//! desktop) through [`PlaybackEngine`] and observes it exclusively through
//! [`EngineEvent`]s pushed into an [`EngineEventSender`].
//!
//! Engine commands are fire-and-forget: implementations enqueue work on their
//! own threads and return immediately. Effects are only ever observed through
//! subsequent events or queries.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use core_async::sync::mpsc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sentinel engines report for a time value that is not known yet
/// (duration of a stream still preparing, live manifests, ...).
///
/// The core normalizes this away; callers of the control surface never see it.
pub const TIME_UNSET: i64 = i64::MIN + 1;

/// Returns `true` when `value` is the engine "unset" sentinel or any other
/// negative marker that cannot be a real timestamp.
pub fn is_time_unset(value: i64) -> bool {
    value == TIME_UNSET || value < 0
}

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an engine instance.
///
/// Used to decide whether a bind request carries "the same" engine and to
/// discard notifications from engines that have since been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(u64);

impl EngineId {
    /// Allocate a fresh identifier. Engine implementations call this once at
    /// construction.
    pub fn next() -> Self {
        Self(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine-{}", self.0)
    }
}

/// Handle returned by [`PlaybackEngine::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Coarse engine lifecycle as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

impl EnginePlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnginePlaybackState::Idle => "idle",
            EnginePlaybackState::Buffering => "buffering",
            EnginePlaybackState::Ready => "ready",
            EnginePlaybackState::Ended => "ended",
        }
    }
}

impl fmt::Display for EnginePlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine resolves a seek target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Resolve to the exact requested sample.
    Exact,
    /// Snap to whichever sync point is closest.
    ClosestSync,
    /// Snap to the sync point at or before the target.
    PreviousSync,
    /// Snap to the sync point at or after the target.
    NextSync,
}

impl SeekMode {
    pub fn is_sample_accurate(&self) -> bool {
        matches!(self, SeekMode::Exact)
    }
}

/// Options applied when the engine is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fall back to secondary decoders when the preferred one fails to
    /// initialize. Hi-res FLAC/ALAC streams regularly trip device decoders.
    pub decoder_fallback: bool,
    /// Prefer bundled extension renderers over platform ones.
    pub prefer_extension_renderers: bool,
    /// Let the engine request and react to audio focus.
    pub handle_audio_focus: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            decoder_fallback: true,
            prefer_extension_renderers: true,
            handle_audio_focus: true,
        }
    }
}

/// Transport settings for network-backed sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
    pub allow_cross_protocol_redirects: bool,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            user_agent: "HiResPlayback/1.0".to_string(),
            allow_cross_protocol_redirects: true,
        }
    }
}

/// Where the engine reads bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File,
    Http(HttpSourceConfig),
}

/// Engine-native source flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSourceKind {
    /// A single file read front to back.
    Progressive,
    /// A manifest (DASH) enumerating periods and representations.
    Adaptive,
}

/// Source object handed to [`PlaybackEngine::set_media_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMediaSource {
    pub kind: EngineSourceKind,
    pub uri: String,
    pub data_source: DataSource,
}

/// Media type of a track group or adaptation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
    Text,
    Unknown,
}

/// PCM sample layout of a decoded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcmEncoding {
    Pcm16,
    Pcm24,
    Pcm32,
    Float,
    /// Engine-specific encoding constant with no mapping here.
    Other(i32),
}

/// Format of one track as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFormat {
    pub id: Option<String>,
    pub sample_mime_type: Option<String>,
    pub container_mime_type: Option<String>,
    pub sample_rate: Option<u32>,
    pub channel_count: Option<u16>,
    /// Bits per second.
    pub bitrate: Option<u32>,
    pub pcm_encoding: Option<PcmEncoding>,
}

/// One track inside a [`TrackGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTrack {
    pub format: TrackFormat,
    pub selected: bool,
}

/// A group of interchangeable tracks (e.g. the renditions of one audio stream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGroup {
    pub track_type: TrackType,
    pub selected: bool,
    pub tracks: Vec<GroupTrack>,
}

impl TrackGroup {
    /// Formats of the selected tracks of a selected audio group.
    pub fn selected_audio_formats(&self) -> impl Iterator<Item = &TrackFormat> {
        let active = self.track_type == TrackType::Audio && self.selected;
        self.tracks
            .iter()
            .filter(move |track| active && track.selected)
            .map(|track| &track.format)
    }
}

/// Adaptation set as exposed by the engine's manifest model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAdaptationSet {
    pub id: i64,
    pub track_type: TrackType,
    pub representation_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPeriod {
    pub adaptation_sets: Vec<RawAdaptationSet>,
}

/// Most recently loaded manifest, as the engine parsed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    pub periods: Vec<RawPeriod>,
    /// Total duration in milliseconds, [`TIME_UNSET`] when unknown.
    pub duration_ms: i64,
    /// Live/dynamic manifest.
    pub dynamic: bool,
}

/// Why the engine's timeline changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineChangeReason {
    PlaylistChanged,
    SourceUpdate,
}

impl TimelineChangeReason {
    /// Numeric code used on the UI wire format.
    pub fn code(&self) -> u8 {
        match self {
            TimelineChangeReason::PlaylistChanged => 0,
            TimelineChangeReason::SourceUpdate => 1,
        }
    }
}

/// State-change notification emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PlaybackStateChanged(EnginePlaybackState),
    IsPlayingChanged(bool),
    TracksChanged(Vec<TrackGroup>),
    TimelineChanged {
        window_count: usize,
        reason: TimelineChangeReason,
    },
    PlayerError {
        message: String,
    },
}

/// An [`EngineEvent`] tagged with the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineNotification {
    pub engine: EngineId,
    pub event: EngineEvent,
}

/// Channel endpoint an engine pushes its events into.
///
/// Engines may call [`send`](Self::send) from any thread; delivery onto the
/// core's command context is the receiver's job.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    engine: EngineId,
    tx: mpsc::UnboundedSender<EngineNotification>,
}

impl EngineEventSender {
    pub fn new(engine: EngineId, tx: mpsc::UnboundedSender<EngineNotification>) -> Self {
        Self { engine, tx }
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }

    /// Push an event. Returns `false` once the receiving side is gone.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx
            .send(EngineNotification {
                engine: self.engine,
                event,
            })
            .is_ok()
    }
}

/// Command surface of a host playback engine.
///
/// All commands must return without waiting for the engine to act on them.
pub trait PlaybackEngine: Send + Sync {
    fn id(&self) -> EngineId;

    /// Register an event sink. The engine pushes every subsequent state
    /// change into it until [`remove_listener`](Self::remove_listener).
    fn add_listener(&self, sender: EngineEventSender) -> ListenerId;

    fn remove_listener(&self, listener: ListenerId);

    /// Replace the current media source. On error the previous source must
    /// remain attached.
    fn set_media_source(&self, source: EngineMediaSource) -> Result<()>;

    /// Start preparing the attached source. Completion is reported through
    /// [`EngineEvent::PlaybackStateChanged`].
    fn prepare(&self);

    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    fn set_seek_mode(&self, mode: SeekMode);

    /// Queue a seek. Engines honour queued seeks once preparation completes.
    fn seek_to(&self, position_ms: i64);

    /// Current position in milliseconds, possibly [`TIME_UNSET`].
    fn current_position_ms(&self) -> i64;

    /// Duration in milliseconds, possibly [`TIME_UNSET`].
    fn duration_ms(&self) -> i64;

    fn is_playing(&self) -> bool;

    fn playback_state(&self) -> EnginePlaybackState;

    fn current_tracks(&self) -> Vec<TrackGroup>;

    /// Manifest of the current adaptive source, if one has loaded.
    fn current_manifest(&self) -> Result<Option<RawManifest>>;

    /// Free native resources. The engine is unusable afterwards.
    fn release(&self);
}

/// Constructs engines on demand.
pub trait EngineFactory: Send + Sync {
    fn create(&self, options: &EngineOptions) -> Result<Arc<dyn PlaybackEngine>>;
}
