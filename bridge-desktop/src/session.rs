//! In-process media session registry.
//!
//! Desktop builds have no OS media session to register with. The registry
//! still enforces identifier uniqueness so collision handling behaves as it
//! does on mobile hosts.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::{
    engine::PlaybackEngine,
    error::{BridgeError, Result},
    session::{MediaSessionFactory, MediaSessionHandle, SessionId, SessionToken},
};
use parking_lot::Mutex;
use tracing::debug;

type LiveIds = Arc<Mutex<HashSet<SessionId>>>;

#[derive(Default)]
pub struct InMemorySessionRegistry {
    live: LiveIds,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_sessions(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_live(&self, id: &SessionId) -> bool {
        self.live.lock().contains(id)
    }
}

impl MediaSessionFactory for InMemorySessionRegistry {
    fn create(
        &self,
        id: &SessionId,
        engine: Arc<dyn PlaybackEngine>,
    ) -> Result<Box<dyn MediaSessionHandle>> {
        if !self.live.lock().insert(id.clone()) {
            return Err(BridgeError::Conflict(format!("session {id} already exists")));
        }
        debug!(session = %id, engine = %engine.id(), "Media session registered");

        Ok(Box::new(InMemorySession {
            id: id.clone(),
            live: Arc::clone(&self.live),
            released: AtomicBool::new(false),
        }))
    }
}

struct InMemorySession {
    id: SessionId,
    live: LiveIds,
    released: AtomicBool,
}

impl MediaSessionHandle for InMemorySession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn token(&self) -> SessionToken {
        SessionToken(format!("in-memory:{}", self.id))
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.live.lock().remove(&self.id);
            debug!(session = %self.id, "Media session released");
        }
    }
}
