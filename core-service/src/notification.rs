//! # Notification & Session Lifecycle
//!
//! Keeps the background host's notification and the platform media session
//! consistent with playback.
//!
//! ## States
//!
//! ```text
//! Unbound ──host start──▶ PlaceholderShown ──set_player──▶ SessionBound
//!                                                              │
//!                                             metadata committed
//!                                                              ▼
//!                         TornDown ◀──teardown / task removed── MetadataShown
//! ```
//!
//! Binding and metadata may arrive before the host has started. Their views
//! are kept but nothing reaches the host until [`LifecycleManager::on_host_start`],
//! which promotes with whatever view is current. Every host start promotes,
//! including restarts of a host that is already showing media.
//!
//! The notification's ongoing flag and play/pause affordance are derived
//! from the last `is_playing` value the engine confirmed. Nothing here
//! anticipates an engine transition.
//!
//! Cover art is never fetched on the command task. [`LifecycleManager::update_metadata`]
//! hands back an [`ArtRequest`]; the caller runs it and reports back through
//! [`LifecycleManager::complete_art_fetch`]. A newer metadata update
//! supersedes older in-flight fetches.

use std::sync::Arc;

use bridge_traits::{
    ActionToken, Artwork, BackgroundHost, EngineEventSender, EngineId, EngineNotification,
    MediaSessionFactory, NotificationAction, NotificationView, PlaybackEngine, RestartPolicy,
    SessionId, Visibility,
};
use core_async::sync::mpsc;
use core_playback::EngineBinder;
use core_runtime::config::{NotificationConfig, PlaybackConfig};
use core_runtime::logging::redact_url;
use tracing::{debug, info, warn};

use crate::artwork::ArtCache;
use crate::error::{Result, ServiceError};
use crate::session::{PlaybackSession, SessionIdGenerator};

/// Background host state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unbound,
    PlaceholderShown,
    /// An engine is bound. `degraded` means no platform session handle.
    SessionBound { degraded: bool },
    MetadataShown,
    TornDown,
}

/// Track metadata supplied by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub art_reference: Option<String>,
}

impl TrackMetadata {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        art_reference: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            art_reference,
        }
    }

    /// The art reference, unless it is missing or blank.
    pub fn art_reference(&self) -> Option<&str> {
        self.art_reference
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
    }
}

/// What the notification currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub art: Option<Artwork>,
    pub is_playing: bool,
}

impl NotificationState {
    /// A playing session shows a persistent notification.
    pub fn is_ongoing(&self) -> bool {
        self.is_playing
    }
}

/// Art fetch the caller must run off the command task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtRequest {
    pub generation: u64,
    pub reference: String,
}

/// Result of [`LifecycleManager::set_player`].
#[derive(Debug)]
pub enum BindOutcome {
    Bound,
    /// Bound without a platform session.
    Degraded(ServiceError),
    /// The engine was already bound; nothing changed.
    AlreadyBound,
}

/// Point-in-time view of the lifecycle manager.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleSnapshot {
    pub state: HostState,
    pub notification: NotificationState,
    pub view: Option<NotificationView>,
    pub engine: Option<EngineId>,
    pub session_id: Option<SessionId>,
    pub degraded: bool,
    pub cached_art: usize,
}

pub struct LifecycleManager {
    config: NotificationConfig,
    host: Arc<dyn BackgroundHost>,
    sessions: Option<Arc<dyn MediaSessionFactory>>,
    ids: SessionIdGenerator,
    restart_policy: RestartPolicy,
    engine_events: mpsc::UnboundedSender<EngineNotification>,
    session: Option<PlaybackSession>,
    state: HostState,
    notification: NotificationState,
    pending: Option<(u64, TrackMetadata)>,
    generation: u64,
    art_cache: ArtCache,
    view: Option<NotificationView>,
    host_started: bool,
}

impl LifecycleManager {
    pub fn new(
        config: &PlaybackConfig,
        engine_events: mpsc::UnboundedSender<EngineNotification>,
    ) -> Self {
        Self {
            config: config.notification.clone(),
            host: Arc::clone(&config.background_host),
            sessions: config.session_factory.clone(),
            ids: SessionIdGenerator::new(Arc::clone(&config.clock)),
            restart_policy: config.restart_policy,
            engine_events,
            session: None,
            state: HostState::Unbound,
            notification: NotificationState::default(),
            pending: None,
            generation: 0,
            art_cache: ArtCache::new(config.artwork_cache_capacity),
            view: None,
            host_started: false,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn notification(&self) -> &NotificationState {
        &self.notification
    }

    /// Last view handed to the background host.
    pub fn current_view(&self) -> Option<&NotificationView> {
        self.view.as_ref()
    }

    pub fn bound_engine_id(&self) -> Option<EngineId> {
        self.session.as_ref().map(PlaybackSession::engine_id)
    }

    pub fn is_degraded(&self) -> bool {
        self.session
            .as_ref()
            .map(PlaybackSession::is_degraded)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        LifecycleSnapshot {
            state: self.state,
            notification: self.notification.clone(),
            view: self.view.clone(),
            engine: self.bound_engine_id(),
            session_id: self
                .session
                .as_ref()
                .and_then(|session| session.session_id().cloned()),
            degraded: self.is_degraded(),
            cached_art: self.art_cache.len(),
        }
    }

    /// The host process started (or was restarted). Puts up the placeholder
    /// notification and promotes the host so it is not reclaimed before an
    /// engine exists.
    ///
    /// A host that already has a session or metadata is promoted with the
    /// current media view instead and keeps its state.
    pub fn on_host_start(&mut self) -> RestartPolicy {
        self.host_started = true;
        let view = match self.state {
            HostState::Unbound | HostState::TornDown => {
                self.state = HostState::PlaceholderShown;
                self.placeholder_view()
            }
            HostState::PlaceholderShown => self.placeholder_view(),
            HostState::SessionBound { .. } | HostState::MetadataShown => {
                if self.notification.title.is_some() {
                    self.media_view()
                } else {
                    self.placeholder_view()
                }
            }
        };

        if let Err(e) = self.host.promote_to_foreground(&view) {
            warn!(error = %e, "Failed to promote host on start");
        }
        info!(
            policy = ?self.restart_policy,
            state = ?self.state,
            title = %view.title,
            "Background host started"
        );
        self.view = Some(view);
        self.restart_policy
    }

    /// Bind `engine`, replacing the current session.
    ///
    /// Binding the engine that is already bound with a session handle is a
    /// no-op. Session handle failures never fail the bind; the session runs
    /// degraded instead, and binding the same engine again retries the handle.
    pub fn set_player(&mut self, engine: Arc<dyn PlaybackEngine>) -> BindOutcome {
        let engine_id = engine.id();
        if self.bound_engine_id() == Some(engine_id) {
            if !self.is_degraded() {
                debug!(engine = %engine_id, "Engine already bound");
                return BindOutcome::AlreadyBound;
            }
            return self.retry_session_handle(&engine);
        }

        if let Some(previous) = self.session.take() {
            info!(
                previous = %previous.engine_id(),
                next = %engine_id,
                "Replacing playback session"
            );
            previous.release();
        }

        let listener =
            engine.add_listener(EngineEventSender::new(engine_id, self.engine_events.clone()));

        let (handle, outcome) = match self.create_session_handle(&engine) {
            Ok(handle) => (Some(handle), BindOutcome::Bound),
            Err(e) => {
                warn!(engine = %engine_id, error = %e, "Continuing without a media session");
                (None, BindOutcome::Degraded(e))
            }
        };

        let session = PlaybackSession::new(engine, listener, handle);
        let degraded = session.is_degraded();
        if let Some(id) = session.session_id() {
            info!(engine = %engine_id, session = %id, "Playback session bound");
        }
        self.session = Some(session);
        self.after_bind(degraded);

        outcome
    }

    /// Same engine, still without a session handle. The listener stays.
    fn retry_session_handle(&mut self, engine: &Arc<dyn PlaybackEngine>) -> BindOutcome {
        let handle = match self.create_session_handle(engine) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(engine = %engine.id(), error = %e, "Media session still unavailable");
                return BindOutcome::Degraded(e);
            }
        };

        info!(engine = %engine.id(), session = %handle.id(), "Media session recovered");
        if let Some(session) = self.session.as_mut() {
            session.attach_handle(handle);
        }
        self.after_bind(false);
        BindOutcome::Bound
    }

    fn after_bind(&mut self, degraded: bool) {
        if self.state == HostState::MetadataShown {
            // Re-render so the view carries the new session token.
            self.commit();
        } else {
            self.state = HostState::SessionBound { degraded };
        }
    }

    fn create_session_handle(
        &self,
        engine: &Arc<dyn PlaybackEngine>,
    ) -> Result<Box<dyn bridge_traits::MediaSessionHandle>> {
        let factory = self.sessions.as_ref().ok_or_else(|| {
            ServiceError::SessionCreationConflict("no media session factory configured".to_string())
        })?;

        let id = self.ids.next_id();
        factory.create(&id, Arc::clone(engine)).map_err(|e| {
            if e.is_conflict() {
                ServiceError::SessionCreationConflict(format!("session {id} already exists"))
            } else {
                ServiceError::SessionCreationConflict(e.to_string())
            }
        })
    }

    /// New track metadata from the UI.
    ///
    /// Returns the art fetch to run, if any. Without art (or with art already
    /// cached) the notification is committed immediately.
    pub fn update_metadata(&mut self, metadata: TrackMetadata) -> Option<ArtRequest> {
        self.generation += 1;
        let generation = self.generation;

        let Some(reference) = metadata.art_reference().map(str::to_string) else {
            self.apply_metadata(metadata, None);
            return None;
        };

        if let Some(artwork) = self.art_cache.get(&reference) {
            debug!(art_url = %redact_url(&reference), "Cover art served from cache");
            self.apply_metadata(metadata, Some(artwork));
            return None;
        }

        self.pending = Some((generation, metadata));
        Some(ArtRequest {
            generation,
            reference,
        })
    }

    /// An art fetch finished. Successful art is cached even when the fetch
    /// has been superseded; only the current generation is rendered.
    pub fn complete_art_fetch(
        &mut self,
        generation: u64,
        reference: &str,
        result: Result<Artwork>,
    ) {
        let artwork = match result {
            Ok(artwork) => {
                self.art_cache.insert(artwork.clone());
                Some(artwork)
            }
            Err(e) => {
                debug!(art_url = %redact_url(reference), error = %e, "Rendering without cover art");
                None
            }
        };

        match self.pending.take() {
            Some((pending, metadata)) if pending == generation => {
                self.apply_metadata(metadata, artwork);
            }
            other => {
                debug!(generation, current = self.generation, "Discarding stale cover art");
                self.pending = other;
            }
        }
    }

    fn apply_metadata(&mut self, metadata: TrackMetadata, art: Option<Artwork>) {
        self.pending = None;
        self.notification.title = Some(metadata.title);
        self.notification.artist = Some(metadata.artist);
        self.notification.art = art;
        self.commit();
    }

    /// The engine confirmed a play/pause flip. Re-renders with the art
    /// already on hand.
    pub fn on_is_playing_changed(&mut self, is_playing: bool) {
        if self.notification.is_playing == is_playing {
            return;
        }
        self.notification.is_playing = is_playing;

        match self.state {
            HostState::Unbound | HostState::TornDown | HostState::PlaceholderShown => {}
            HostState::SessionBound { .. } | HostState::MetadataShown => self.commit(),
        }
    }

    /// The host task was removed (app swiped away).
    ///
    /// While playing, everything is torn down and the host terminated.
    /// Returns `true` in that case.
    pub fn on_task_removed(&mut self) -> bool {
        if !self.notification.is_playing {
            info!("Task removed while paused, keeping host");
            return false;
        }

        info!("Task removed while playing, shutting down");
        self.host_started = false;
        if let Some(session) = self.session.take() {
            session.engine().stop();
            session.release();
        }
        if let Err(e) = self.host.remove_notification() {
            warn!(error = %e, "Failed to remove notification");
        }
        if let Err(e) = self.host.terminate() {
            warn!(error = %e, "Failed to terminate background host");
        }
        self.reset();
        true
    }

    /// Release the session and engine and take the notification down.
    pub fn teardown(&mut self) {
        if self.state == HostState::TornDown {
            return;
        }
        if let Some(session) = self.session.take() {
            session.release();
        }
        if let Err(e) = self.host.demote(true) {
            warn!(error = %e, "Failed to demote background host");
        }
        self.reset();
        info!("Playback lifecycle torn down");
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.notification = NotificationState::default();
        self.view = None;
        self.state = HostState::TornDown;
    }

    fn commit(&mut self) {
        if self.state == HostState::TornDown {
            debug!("Notification update after teardown ignored");
            return;
        }

        let view = self.media_view();
        let result = if !self.host_started {
            debug!(title = %view.title, "Host not started, holding notification");
            Ok(())
        } else if view.ongoing {
            self.host.promote_to_foreground(&view)
        } else {
            self.host
                .post_notification(&view)
                .and_then(|_| self.host.demote(false))
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to publish notification");
        }

        debug!(
            title = %view.title,
            ongoing = view.ongoing,
            has_art = view.has_art(),
            session = view.session.is_some(),
            "Notification committed"
        );
        self.view = Some(view);
        if self.notification.title.is_some() {
            self.state = HostState::MetadataShown;
        }
    }

    fn placeholder_view(&self) -> NotificationView {
        NotificationView {
            channel_id: self.config.channel_id.clone(),
            title: self.config.placeholder_title().to_string(),
            text: self.config.placeholder_text.clone(),
            sub_text: None,
            large_icon: None,
            actions: Vec::new(),
            compact_actions: Vec::new(),
            session: None,
            ongoing: true,
            visibility: Visibility::Public,
            only_alert_once: true,
            reactivate_ui_on_tap: true,
        }
    }

    fn media_view(&self) -> NotificationView {
        let play_pause = if self.notification.is_playing {
            ActionToken::Pause
        } else {
            ActionToken::Play
        };

        let (actions, compact_actions) = if self.config.show_skip_actions {
            (
                vec![
                    NotificationAction::for_token(ActionToken::SkipPrevious),
                    NotificationAction::for_token(play_pause),
                    NotificationAction::for_token(ActionToken::SkipNext),
                ],
                vec![0, 1, 2],
            )
        } else {
            (vec![NotificationAction::for_token(play_pause)], vec![0])
        };

        NotificationView {
            channel_id: self.config.channel_id.clone(),
            title: self
                .notification
                .title
                .clone()
                .unwrap_or_else(|| self.config.placeholder_title().to_string()),
            text: self
                .notification
                .artist
                .clone()
                .unwrap_or_else(|| self.config.placeholder_text.clone()),
            sub_text: Some(self.config.app_label.clone()),
            large_icon: self.notification.art.clone(),
            actions,
            compact_actions,
            session: self.session.as_ref().and_then(PlaybackSession::token),
            ongoing: self.notification.is_ongoing(),
            visibility: Visibility::Public,
            only_alert_once: true,
            reactivate_ui_on_tap: true,
        }
    }
}

impl EngineBinder for LifecycleManager {
    fn bind_engine(&mut self, engine: Arc<dyn PlaybackEngine>) {
        match self.set_player(engine) {
            BindOutcome::Degraded(e) => debug!(error = %e, "Engine bound in degraded mode"),
            outcome => debug!(?outcome, "Engine bound"),
        }
    }
}
