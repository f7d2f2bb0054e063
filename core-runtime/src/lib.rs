//! # Core Runtime
//!
//! Foundational infrastructure shared by the playback crates:
//! - Configuration (`PlaybackConfig` and its builder)
//! - The UI event vocabulary and its single-consumer dispatcher
//! - Logging and tracing setup

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{NotificationConfig, PlaybackConfig, PlaybackConfigBuilder, ResolverRules};
pub use error::{Error, Result};
pub use events::{ControlEvent, EventDispatcher, EventStream, SourceKind};
