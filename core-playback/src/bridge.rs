//! # Event Bridge
//!
//! Translates engine notifications into [`ControlEvent`]s for the UI.
//!
//! The bridge keeps a small amount of state so the UI never sees duplicate
//! or out-of-order transitions:
//!
//! - repeated identical playback states are suppressed
//! - `is_playing_changed { true }` is deferred until the engine is `Ready`
//! - leaving `Ready` while playing emits `is_playing_changed { false }`
//! - `tracks_changed` is emitted on every track change and once more on the
//!   first `Ready` of each source
//!
//! Events leave through the [`EventDispatcher`], so emission order equals
//! delivery order.

use bridge_traits::{EngineEvent, EnginePlaybackState, TrackGroup};
use core_runtime::events::{ControlEvent, EventDispatcher};
use tracing::{debug, warn};

use crate::adapter::EngineAdapter;
use crate::quality::{empty_tracks_event, log_audio_quality, AudioQuality};

pub struct EventBridge {
    dispatcher: EventDispatcher,
    state: EnginePlaybackState,
    is_playing: bool,
    pending_play: bool,
    ready_tracks_reported: bool,
}

impl EventBridge {
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher,
            state: EnginePlaybackState::Idle,
            is_playing: false,
            pending_play: false,
            ready_tracks_reported: false,
        }
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Last playback state reported to the UI.
    pub fn state(&self) -> EnginePlaybackState {
        self.state
    }

    /// Last `is_playing` value reported to the UI.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Emit an event that did not originate from the engine (`source_set`,
    /// skip requests, command errors).
    pub fn emit(&self, event: ControlEvent) {
        debug!(event = event.name(), "Emitting control event");
        self.dispatcher.emit(event);
    }

    /// A new source was attached to the same engine. The next state the
    /// engine reports is always a transition, even `Ready` straight away.
    pub fn on_source_changed(&mut self) {
        self.state = EnginePlaybackState::Idle;
        self.ready_tracks_reported = false;
        self.pending_play = false;
    }

    /// The bound engine was replaced or released. Reports `false` if the UI
    /// still believed playback was running.
    pub fn on_engine_replaced(&mut self) -> Option<bool> {
        let was_playing = self.is_playing;
        self.state = EnginePlaybackState::Idle;
        self.pending_play = false;
        self.ready_tracks_reported = false;
        self.is_playing = false;

        if was_playing {
            self.emit(ControlEvent::IsPlayingChanged { is_playing: false });
            return Some(false);
        }
        None
    }

    /// Process one engine event.
    ///
    /// Returns the new `is_playing` value when it changed, so the caller can
    /// refresh anything that mirrors playback state.
    pub fn handle(&mut self, event: EngineEvent, adapter: &mut EngineAdapter) -> Option<bool> {
        match event {
            EngineEvent::PlaybackStateChanged(state) => self.on_state(state, adapter),
            EngineEvent::IsPlayingChanged(is_playing) => self.on_is_playing(is_playing, adapter),
            EngineEvent::TracksChanged(groups) => {
                self.on_tracks(&groups);
                None
            }
            EngineEvent::TimelineChanged {
                window_count,
                reason,
            } => {
                if window_count > 0 {
                    self.emit(ControlEvent::TimelineChanged {
                        window_count,
                        reason: reason.code(),
                    });
                }
                adapter.refresh_manifest();
                None
            }
            EngineEvent::PlayerError { message } => {
                warn!(error = %message, state = %self.state, "Engine reported an error");
                self.emit(ControlEvent::Error { message });
                None
            }
        }
    }

    fn on_state(
        &mut self,
        state: EnginePlaybackState,
        adapter: &mut EngineAdapter,
    ) -> Option<bool> {
        if state == self.state {
            return None;
        }

        let previous = std::mem::replace(&mut self.state, state);
        debug!(from = %previous, to = %state, "Playback state changed");
        self.emit(ControlEvent::PlaybackStateChanged { state });

        let mut changed = None;
        if previous == EnginePlaybackState::Ready && self.is_playing {
            self.is_playing = false;
            self.emit(ControlEvent::IsPlayingChanged { is_playing: false });
            changed = Some(false);
        }

        match state {
            EnginePlaybackState::Ready => {
                if !self.ready_tracks_reported {
                    self.ready_tracks_reported = true;
                    let quality = adapter.audio_quality();
                    log_audio_quality("ready", quality.as_ref());
                    self.emit(tracks_event(quality.as_ref()));
                    adapter.refresh_manifest();
                }
                if std::mem::take(&mut self.pending_play) {
                    self.is_playing = true;
                    self.emit(ControlEvent::IsPlayingChanged { is_playing: true });
                    changed = Some(true);
                }
            }
            EnginePlaybackState::Idle | EnginePlaybackState::Ended => {
                self.pending_play = false;
            }
            EnginePlaybackState::Buffering => {}
        }

        changed
    }

    fn on_is_playing(&mut self, is_playing: bool, adapter: &EngineAdapter) -> Option<bool> {
        if !is_playing {
            self.pending_play = false;
            if !self.is_playing {
                return None;
            }
            self.is_playing = false;
            self.emit(ControlEvent::IsPlayingChanged { is_playing: false });
            return Some(false);
        }

        if self.state != EnginePlaybackState::Ready {
            debug!(state = %self.state, "Deferring is_playing until ready");
            self.pending_play = true;
            return None;
        }
        if self.is_playing {
            return None;
        }

        self.is_playing = true;
        log_audio_quality("playback started", adapter.audio_quality().as_ref());
        self.emit(ControlEvent::IsPlayingChanged { is_playing: true });
        Some(true)
    }

    fn on_tracks(&mut self, groups: &[TrackGroup]) {
        let quality = AudioQuality::from_tracks(groups);
        log_audio_quality("tracks changed", quality.as_ref());
        self.emit(tracks_event(quality.as_ref()));
    }
}

fn tracks_event(quality: Option<&AudioQuality>) -> ControlEvent {
    quality
        .map(AudioQuality::to_event)
        .unwrap_or_else(empty_tracks_event)
}
