//! The live binding between one engine and one platform session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bridge_traits::{
    Clock, EngineId, ListenerId, MediaSessionHandle, PlaybackEngine, SessionId, SessionToken,
};
use tracing::debug;

/// Generates session identifiers from the wall clock plus a running
/// sequence, so two sessions created within the same millisecond still differ.
pub struct SessionIdGenerator {
    clock: Arc<dyn Clock>,
    seq: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            seq: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> SessionId {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        SessionId::new(format!(
            "hires-playback-{}-{}",
            self.clock.unix_timestamp_millis(),
            seq
        ))
    }
}

/// Exclusively owns the engine and the session handle.
///
/// A session is replaced, never rebuilt: binding a different engine releases
/// this one first. Only a missing handle can be filled in later.
pub struct PlaybackSession {
    engine: Arc<dyn PlaybackEngine>,
    listener: ListenerId,
    handle: Option<Box<dyn MediaSessionHandle>>,
}

impl PlaybackSession {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        listener: ListenerId,
        handle: Option<Box<dyn MediaSessionHandle>>,
    ) -> Self {
        Self {
            engine,
            listener,
            handle,
        }
    }

    pub fn engine(&self) -> &Arc<dyn PlaybackEngine> {
        &self.engine
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine.id()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.handle.as_ref().map(|handle| handle.id())
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.handle.as_ref().map(|handle| handle.token())
    }

    /// Install a handle on a degraded session. A handle already present is
    /// released in favour of the new one.
    pub fn attach_handle(&mut self, handle: Box<dyn MediaSessionHandle>) {
        if let Some(previous) = self.handle.replace(handle) {
            previous.release();
        }
    }

    /// Running without a platform session handle.
    pub fn is_degraded(&self) -> bool {
        self.handle.is_none()
    }

    /// Detach the listener, release the session handle and then the engine.
    pub fn release(self) {
        let engine_id = self.engine.id();
        self.engine.remove_listener(self.listener);
        if let Some(handle) = self.handle {
            debug!(session = %handle.id(), "Releasing media session");
            handle.release();
        }
        self.engine.release();
        debug!(engine = %engine_id, "Playback session released");
    }
}
