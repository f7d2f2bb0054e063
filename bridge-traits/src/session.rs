//! Platform media session.
//!
//! A media session exposes transport controls to lock screens, headsets and
//! remote surfaces. Session identifiers must be unique per live session;
//! factories report a collision with [`BridgeError::Conflict`](crate::error::BridgeError::Conflict).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::PlaybackEngine;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token a notification uses to attach itself to a session
/// (the compat token on Android).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Live platform session registration.
pub trait MediaSessionHandle: Send + Sync {
    fn id(&self) -> &SessionId;

    fn token(&self) -> SessionToken;

    /// Unregister from the platform. Releasing twice is harmless.
    fn release(&self);
}

pub trait MediaSessionFactory: Send + Sync {
    /// Register a session for `engine` under `id`.
    fn create(
        &self,
        id: &SessionId,
        engine: Arc<dyn PlaybackEngine>,
    ) -> Result<Box<dyn MediaSessionHandle>>;
}
