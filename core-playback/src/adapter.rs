//! # Playback Engine Adapter
//!
//! Stable command surface over the host engine.
//!
//! The adapter never owns the engine: the playback session does. It keeps a
//! [`Weak`] reference and hands freshly constructed engines to an
//! [`EngineBinder`] before any media is attached, so session and
//! notification plumbing exist before the first state change arrives.
//!
//! Every command returns as soon as it has been issued. Effects are observed
//! through engine events, never through return values.

use std::sync::{Arc, Weak};
use std::time::Duration;

use bridge_traits::engine::{is_time_unset, SeekMode};
use bridge_traits::{EngineFactory, EngineId, EngineOptions, HttpSourceConfig, PlaybackEngine};
use core_runtime::logging::redact_url;
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::manifest::ManifestSummary;
use crate::quality::{log_audio_quality, AudioQuality};
use crate::source::{MediaSourceDescriptor, SourceKind};

/// How long after a seek the selected format is logged again.
const AFTER_SEEK_LOG_DELAY: Duration = Duration::from_millis(200);

/// Receives engines constructed by the adapter.
///
/// The binder becomes the engine's owner. It must keep the engine alive for
/// as long as it stays bound.
pub trait EngineBinder {
    fn bind_engine(&mut self, engine: Arc<dyn PlaybackEngine>);
}

pub struct EngineAdapter {
    factory: Arc<dyn EngineFactory>,
    options: EngineOptions,
    http: HttpSourceConfig,
    engine: Option<Weak<dyn PlaybackEngine>>,
    engine_id: Option<EngineId>,
    current: Option<MediaSourceDescriptor>,
}

impl EngineAdapter {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        options: EngineOptions,
        http: HttpSourceConfig,
    ) -> Self {
        Self {
            factory,
            options,
            http,
            engine: None,
            engine_id: None,
            current: None,
        }
    }

    /// The bound engine, if one exists and its owner still holds it.
    pub fn engine(&self) -> Option<Arc<dyn PlaybackEngine>> {
        self.engine.as_ref().and_then(Weak::upgrade)
    }

    pub fn engine_id(&self) -> Option<EngineId> {
        self.engine().and(self.engine_id)
    }

    pub fn current_source(&self) -> Option<&MediaSourceDescriptor> {
        self.current.as_ref()
    }

    /// Point the adapter at an engine owned elsewhere.
    ///
    /// Switching to a different engine forgets the current source: the new
    /// engine has nothing attached yet.
    pub fn attach(&mut self, engine: &Arc<dyn PlaybackEngine>) {
        let id = engine.id();
        if self.engine_id != Some(id) {
            self.current = None;
        }
        engine.set_seek_mode(SeekMode::Exact);
        self.engine = Some(Arc::downgrade(engine));
        self.engine_id = Some(id);
        debug!(engine = %id, "Engine attached to adapter");
    }

    /// Forget the engine and the current source.
    pub fn detach(&mut self) {
        if let Some(id) = self.engine_id.take() {
            debug!(engine = %id, "Engine detached from adapter");
        }
        self.engine = None;
        self.current = None;
    }

    /// Attach `descriptor` and start preparing it.
    ///
    /// Constructs (and binds) an engine first if none exists.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::EngineInit`] when the factory fails
    /// - [`PlaybackError::Source`] when the engine rejects the source; the
    ///   previous source stays attached
    pub fn set_source(
        &mut self,
        descriptor: MediaSourceDescriptor,
        binder: &mut dyn EngineBinder,
    ) -> Result<()> {
        let engine = match self.engine() {
            Some(engine) => engine,
            None => self.create_engine(binder)?,
        };

        let source = descriptor.to_engine_source(&self.http);
        engine
            .set_media_source(source)
            .map_err(|e| PlaybackError::Source(e.to_string()))?;
        engine.prepare();

        info!(
            engine = %engine.id(),
            kind = %descriptor.kind(),
            url = %redact_url(descriptor.uri()),
            "Source attached, preparing"
        );
        self.current = Some(descriptor);
        Ok(())
    }

    fn create_engine(&mut self, binder: &mut dyn EngineBinder) -> Result<Arc<dyn PlaybackEngine>> {
        let engine = self
            .factory
            .create(&self.options)
            .map_err(|e| PlaybackError::EngineInit(e.to_string()))?;

        info!(
            engine = %engine.id(),
            decoder_fallback = self.options.decoder_fallback,
            "Playback engine constructed"
        );

        self.attach(&engine);
        binder.bind_engine(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn play(&self) {
        match self.engine() {
            Some(engine) => engine.play(),
            None => debug!("play() ignored, no engine"),
        }
    }

    pub fn pause(&self) {
        match self.engine() {
            Some(engine) => engine.pause(),
            None => debug!("pause() ignored, no engine"),
        }
    }

    pub fn stop(&self) {
        match self.engine() {
            Some(engine) => engine.stop(),
            None => debug!("stop() ignored, no engine"),
        }
    }

    /// Queue a sample-accurate seek.
    ///
    /// The seek is issued whatever the engine state; engines apply queued
    /// seeks once preparation completes. Without an engine this is a no-op.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidArgument`] for negative positions.
    pub fn seek_to(&self, position_ms: i64) -> Result<()> {
        if position_ms < 0 {
            return Err(PlaybackError::InvalidArgument(format!(
                "seek position must be >= 0, got {position_ms}"
            )));
        }

        let Some(engine) = self.engine() else {
            debug!(position_ms, "seek_to() ignored, no engine");
            return Ok(());
        };

        log_audio_quality("before seek", self.audio_quality().as_ref());
        engine.set_seek_mode(SeekMode::Exact);
        engine.seek_to(position_ms);
        debug!(
            position_ms,
            state = %engine.playback_state(),
            "Seek queued"
        );
        self.log_quality_after_seek();
        Ok(())
    }

    /// Log the format again once the seek has settled. Only runs inside a
    /// runtime; the engine is not kept alive for it.
    fn log_quality_after_seek(&self) {
        let (Some(runtime), Some(engine)) = (core_async::runtime::current(), self.engine.clone())
        else {
            return;
        };
        runtime.spawn(async move {
            core_async::sleep(AFTER_SEEK_LOG_DELAY).await;
            if let Some(engine) = engine.upgrade() {
                let quality = AudioQuality::from_tracks(&engine.current_tracks());
                log_audio_quality("after seek", quality.as_ref());
            }
        });
    }

    /// Position in milliseconds, 0 when unknown.
    pub fn current_position(&self) -> u64 {
        self.engine()
            .map(|engine| normalize_time(engine.current_position_ms()))
            .unwrap_or(0)
    }

    /// Duration in milliseconds, 0 when unknown.
    pub fn duration(&self) -> u64 {
        self.engine()
            .map(|engine| normalize_time(engine.duration_ms()))
            .unwrap_or(0)
    }

    pub fn is_playing(&self) -> bool {
        self.engine()
            .map(|engine| engine.is_playing())
            .unwrap_or(false)
    }

    pub fn audio_quality(&self) -> Option<AudioQuality> {
        let engine = self.engine()?;
        AudioQuality::from_tracks(&engine.current_tracks())
    }

    /// Summary of the current adaptive manifest, or `None` when no manifest
    /// has loaded (or the source is not adaptive).
    pub fn manifest_info(&mut self) -> Option<ManifestSummary> {
        if let Some(summary) = self.current.as_ref().and_then(|d| d.manifest()) {
            return Some(summary.clone());
        }
        self.refresh_manifest()
    }

    /// Re-read the manifest from the engine. Collection failures degrade to
    /// `None`.
    pub fn refresh_manifest(&mut self) -> Option<ManifestSummary> {
        let descriptor = self.current.as_ref()?;
        if descriptor.kind() != SourceKind::Adaptive {
            return None;
        }
        let engine = self.engine()?;

        let summary = match engine.current_manifest() {
            Ok(Some(raw)) => Some(ManifestSummary::from_raw(&raw)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Manifest unavailable");
                None
            }
        };

        if let Some(summary) = &summary {
            debug!(
                periods = summary.period_count,
                duration_ms = summary.duration_ms,
                dynamic = summary.dynamic,
                "Manifest summary refreshed"
            );
            self.current = Some(descriptor.with_manifest(Some(summary.clone())));
        }
        summary
    }
}

fn normalize_time(value: i64) -> u64 {
    if is_time_unset(value) {
        0
    } else {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceResolver;
    use bridge_traits::engine::{
        EngineEventSender, EngineMediaSource, EnginePlaybackState, ListenerId, RawAdaptationSet,
        RawManifest, RawPeriod, TrackGroup, TrackType, TIME_UNSET,
    };
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::BridgeError;
    use mockall::{mock, predicate::*, Sequence};
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        pub Engine {}

        impl PlaybackEngine for Engine {
            fn id(&self) -> EngineId;
            fn add_listener(&self, sender: EngineEventSender) -> ListenerId;
            fn remove_listener(&self, listener: ListenerId);
            fn set_media_source(&self, source: EngineMediaSource) -> BridgeResult<()>;
            fn prepare(&self);
            fn play(&self);
            fn pause(&self);
            fn stop(&self);
            fn set_seek_mode(&self, mode: SeekMode);
            fn seek_to(&self, position_ms: i64);
            fn current_position_ms(&self) -> i64;
            fn duration_ms(&self) -> i64;
            fn is_playing(&self) -> bool;
            fn playback_state(&self) -> EnginePlaybackState;
            fn current_tracks(&self) -> Vec<TrackGroup>;
            fn current_manifest(&self) -> BridgeResult<Option<RawManifest>>;
            fn release(&self);
        }
    }

    mock! {
        pub Factory {}

        impl EngineFactory for Factory {
            fn create(&self, options: &EngineOptions) -> BridgeResult<Arc<dyn PlaybackEngine>>;
        }
    }

    #[derive(Default)]
    struct Owner {
        engines: Vec<Arc<dyn PlaybackEngine>>,
    }

    impl EngineBinder for Owner {
        fn bind_engine(&mut self, engine: Arc<dyn PlaybackEngine>) {
            self.engines.push(engine);
        }
    }

    fn quiet_engine(id: EngineId) -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_id().return_const(id);
        engine.expect_set_seek_mode().return_const(());
        engine.expect_current_tracks().returning(Vec::new);
        engine
            .expect_playback_state()
            .return_const(EnginePlaybackState::Idle);
        engine
    }

    fn adapter_with(factory: MockFactory) -> EngineAdapter {
        EngineAdapter::new(
            Arc::new(factory),
            EngineOptions::default(),
            HttpSourceConfig::default(),
        )
    }

    fn descriptor(url: &str) -> MediaSourceDescriptor {
        SourceResolver::default().resolve(url).unwrap()
    }

    #[test]
    fn test_commands_without_engine_are_noops() {
        let adapter = adapter_with(MockFactory::new());
        adapter.play();
        adapter.pause();
        adapter.stop();
        assert!(adapter.seek_to(1_000).is_ok());
        assert_eq!(adapter.current_position(), 0);
        assert_eq!(adapter.duration(), 0);
        assert!(!adapter.is_playing());
        assert!(adapter.engine_id().is_none());
    }

    #[test]
    fn test_negative_seek_is_rejected_without_touching_engine() {
        let adapter = adapter_with(MockFactory::new());
        let err = adapter.seek_to(-5).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidArgument(_)));
    }

    #[test]
    fn test_set_source_creates_and_binds_engine_before_attaching_media() {
        let id = EngineId::next();
        let mut engine = quiet_engine(id);
        let mut seq = Sequence::new();
        engine
            .expect_set_media_source()
            .withf(|source| {
                source.uri == "http://host/track.flac"
                    && source.kind == bridge_traits::EngineSourceKind::Progressive
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        engine
            .expect_prepare()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .withf(|options| options.decoder_fallback)
            .times(1)
            .returning(move |_| Ok(Arc::clone(&engine)));

        let mut adapter = adapter_with(factory);
        let mut owner = Owner::default();
        adapter
            .set_source(descriptor("http://host/track.flac"), &mut owner)
            .unwrap();

        assert_eq!(owner.engines.len(), 1);
        assert_eq!(adapter.engine_id(), Some(id));
        assert_eq!(
            adapter.current_source().map(|d| d.kind()),
            Some(SourceKind::Progressive)
        );
    }

    #[test]
    fn test_engine_init_failure() {
        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .returning(|_| Err(BridgeError::NotAvailable("no codec".to_string())));

        let mut adapter = adapter_with(factory);
        let mut owner = Owner::default();
        let err = adapter
            .set_source(descriptor("http://host/track.flac"), &mut owner)
            .unwrap_err();

        assert!(matches!(err, PlaybackError::EngineInit(_)));
        assert!(owner.engines.is_empty());
        assert!(adapter.current_source().is_none());
    }

    #[test]
    fn test_rejected_source_keeps_previous() {
        let mut engine = quiet_engine(EngineId::next());
        engine
            .expect_set_media_source()
            .withf(|source| source.uri.ends_with("good.flac"))
            .returning(|_| Ok(()));
        engine
            .expect_set_media_source()
            .withf(|source| source.uri.ends_with("bad.flac"))
            .returning(|_| Err(BridgeError::OperationFailed("unsupported".to_string())));
        engine.expect_prepare().times(1).return_const(());

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);

        let mut owner = Owner::default();
        adapter
            .set_source(descriptor("http://host/good.flac"), &mut owner)
            .unwrap();
        let err = adapter
            .set_source(descriptor("http://host/bad.flac"), &mut owner)
            .unwrap_err();

        assert!(matches!(err, PlaybackError::Source(_)));
        assert_eq!(
            adapter.current_source().map(|d| d.uri()),
            Some("http://host/good.flac")
        );
        assert!(owner.engines.is_empty());
    }

    #[core_async::test]
    async fn test_seek_logs_quality_again_after_settling() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let mut engine = MockEngine::new();
        engine.expect_current_tracks().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        });
        engine
            .expect_playback_state()
            .return_const(EnginePlaybackState::Ready);
        engine.expect_set_seek_mode().return_const(());
        engine.expect_seek_to().return_const(());

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.engine = Some(Arc::downgrade(&engine));

        adapter.seek_to(1_000).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        core_async::sleep(AFTER_SEEK_LOG_DELAY * 2).await;
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_seek_selects_exact_mode_first() {
        let mut engine = MockEngine::new();
        let mut seq = Sequence::new();
        engine.expect_current_tracks().returning(Vec::new);
        engine
            .expect_playback_state()
            .return_const(EnginePlaybackState::Buffering);
        engine
            .expect_set_seek_mode()
            .with(eq(SeekMode::Exact))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_seek_to()
            .with(eq(42_000))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_set_seek_mode()
            .with(eq(SeekMode::Exact))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_seek_to()
            .with(eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        // Bypass attach() so only the seek calls are sequenced.
        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.engine = Some(Arc::downgrade(&engine));

        adapter.seek_to(42_000).unwrap();
        adapter.seek_to(0).unwrap();
    }

    #[test]
    fn test_time_values_are_normalized() {
        let mut engine = quiet_engine(EngineId::next());
        engine.expect_current_position_ms().return_const(TIME_UNSET);
        engine.expect_duration_ms().return_const(215_000i64);

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);

        assert_eq!(adapter.current_position(), 0);
        assert_eq!(adapter.duration(), 215_000);
    }

    #[test]
    fn test_adapter_does_not_keep_engine_alive() {
        let engine: Arc<dyn PlaybackEngine> = Arc::new(quiet_engine(EngineId::next()));
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);
        assert!(adapter.engine().is_some());

        drop(engine);
        assert!(adapter.engine().is_none());
        adapter.play();
        assert_eq!(adapter.duration(), 0);
    }

    #[test]
    fn test_manifest_info() {
        let mut engine = quiet_engine(EngineId::next());
        engine.expect_set_media_source().returning(|_| Ok(()));
        engine.expect_prepare().return_const(());
        let mut loaded = false;
        engine.expect_current_manifest().returning(move || {
            if !loaded {
                loaded = true;
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
                duration_ms: TIME_UNSET,
                dynamic: false,
            }))
        });

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);
        let mut owner = Owner::default();
        adapter
            .set_source(descriptor("http://host/stream.mpd"), &mut owner)
            .unwrap();

        assert!(adapter.manifest_info().is_none());
        let summary = adapter.manifest_info().unwrap();
        assert_eq!(summary.period_count, 1);
        assert_eq!(summary.duration_ms, 0);
        // Cached on the descriptor now.
        assert_eq!(adapter.manifest_info(), Some(summary));
    }

    #[test]
    fn test_manifest_failure_degrades_to_absent() {
        let mut engine = quiet_engine(EngineId::next());
        engine.expect_set_media_source().returning(|_| Ok(()));
        engine.expect_prepare().return_const(());
        engine
            .expect_current_manifest()
            .returning(|| Err(BridgeError::OperationFailed("parse".to_string())));

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);
        adapter
            .set_source(descriptor("http://host/stream.mpd"), &mut Owner::default())
            .unwrap();

        assert!(adapter.manifest_info().is_none());
    }

    #[test]
    fn test_progressive_source_has_no_manifest() {
        let mut engine = quiet_engine(EngineId::next());
        engine.expect_set_media_source().returning(|_| Ok(()));
        engine.expect_prepare().return_const(());
        engine.expect_current_manifest().never();

        let engine: Arc<dyn PlaybackEngine> = Arc::new(engine);
        let mut adapter = adapter_with(MockFactory::new());
        adapter.attach(&engine);
        adapter
            .set_source(descriptor("http://host/track.flac"), &mut Owner::default())
            .unwrap();

        assert!(adapter.manifest_info().is_none());
    }
}
