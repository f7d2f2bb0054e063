//! Playback service façade.
//!
//! This crate wires the host-provided capabilities from a
//! [`PlaybackConfig`](core_runtime::config::PlaybackConfig) into one command
//! task and exposes it through [`PlaybackHandle`]. Desktop builds enable the
//! `desktop-shims` feature, which fills in a headless background host, an
//! in-memory session registry and an HTTP artwork fetcher from
//! `bridge-desktop`.

pub mod artwork;
pub mod channel;
pub mod error;
pub mod notification;
pub mod router;
pub mod service;
pub mod session;

pub use channel::{MethodCall, MethodResponse};
pub use error::{Result, ServiceError};
pub use notification::{
    BindOutcome, HostState, LifecycleManager, LifecycleSnapshot, NotificationState, TrackMetadata,
};
pub use router::ControlActionRouter;
pub use service::{PlaybackHandle, PlaybackService};
pub use session::{PlaybackSession, SessionIdGenerator};

use core_runtime::config::PlaybackConfig;

/// Build and start a playback service from `config`.
pub fn bootstrap(config: PlaybackConfig) -> Result<PlaybackHandle> {
    PlaybackService::spawn(config)
}
