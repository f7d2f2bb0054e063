//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from its host platform.
//!
//! ## Traits
//!
//! ### Playback
//! - [`PlaybackEngine`](engine::PlaybackEngine) / [`EngineFactory`](engine::EngineFactory) - the decoding/rendering engine
//! - [`MediaSessionFactory`](session::MediaSessionFactory) - platform transport-control registration
//!
//! ### Background execution
//! - [`BackgroundHost`](background::BackgroundHost) - foreground promotion, notification posting, termination
//! - [`ArtworkFetcher`](artwork::ArtworkFetcher) - cover art for the notification
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - time source for session identifiers
//! - [`LoggerSink`](time::LoggerSink) - forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop / headless | `bridge-desktop` |
//! | Android  | host app (ExoPlayer, foreground service, MediaSession) |
//! | iOS      | host app (AVPlayer, Now Playing) |
//!
//! The core fails fast with `CapabilityMissing` when a required capability
//! (engine factory, background host) is not supplied.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Engine callbacks may arrive on any
//! thread; the core marshals them onto its command context itself.

pub mod artwork;
pub mod background;
pub mod engine;
pub mod error;
pub mod notification;
pub mod session;
pub mod time;

pub use artwork::{Artwork, ArtworkFetcher};
pub use background::{BackgroundHost, RestartPolicy};
pub use engine::{
    DataSource, EngineEvent, EngineEventSender, EngineFactory, EngineId, EngineMediaSource,
    EngineNotification, EngineOptions, EnginePlaybackState, EngineSourceKind, HttpSourceConfig,
    ListenerId, PlaybackEngine, RawManifest, SeekMode, TrackFormat, TrackGroup, TrackType,
    TIME_UNSET,
};
pub use error::{BridgeError, Result};
pub use notification::{ActionToken, NotificationAction, NotificationView, Visibility};
pub use session::{MediaSessionFactory, MediaSessionHandle, SessionId, SessionToken};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
