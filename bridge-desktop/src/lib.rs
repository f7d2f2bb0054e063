//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and headless
//! processes (macOS, Windows, Linux, CI).
//!
//! ## Overview
//!
//! - `ArtworkFetcher` using `reqwest` for HTTP and `tokio::fs` for local
//!   files, with `image` for format and size detection
//! - `BackgroundHost` as a recording no-op (desktop processes are always
//!   foreground)
//! - `MediaSessionFactory` as an in-process registry that still rejects
//!   duplicate identifiers
//!
//! The playback engine itself is never provided here; hosts inject one.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessHost, HttpArtworkFetcher, InMemorySessionRegistry};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = PlaybackConfig::builder()
//!     .engine_factory(my_engine_factory)
//!     .background_host(Arc::new(HeadlessHost::new()))
//!     .session_factory(Arc::new(InMemorySessionRegistry::new()))
//!     .artwork_fetcher(Arc::new(HttpArtworkFetcher::new(Duration::from_secs(10), "HiResPlayback/1.0")?))
//!     .build()?;
//! ```

mod artwork;
mod host;
mod session;

pub use artwork::HttpArtworkFetcher;
pub use host::{HeadlessHost, HostEvent};
pub use session::InMemorySessionRegistry;
