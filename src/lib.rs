//! Hi-res playback core.
//!
//! This crate exposes the workspace behind two feature flags:
//!
//! - `desktop-shims` (default): the full service plus the headless host,
//!   in-memory session registry and HTTP artwork fetcher from
//!   `bridge-desktop`
//! - `core`: the service without any bundled host capabilities; the host
//!   supplies every bridge implementation itself
//!
//! Host applications depend on `hires-playback` and enable one of them
//! instead of wiring each workspace crate individually.

pub use bridge_traits as bridge;

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_playback as playback;
#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_runtime as runtime;
#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_service as service;

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_service::{bootstrap, PlaybackHandle, ServiceError, TrackMetadata};
