//! # Playback Module
//!
//! Drives a host playback engine and translates what it reports.
//!
//! ## Overview
//!
//! This module handles:
//! - Classifying source references (local file, progressive HTTP, DASH)
//! - Issuing engine commands through a non-owning adapter
//! - Turning engine notifications into deduplicated UI events
//! - Audio quality and manifest diagnostics
//!
//! Nothing here spawns tasks or holds locks: every type is meant to be
//! owned by the single command task in `core-service`.

pub mod adapter;
pub mod bridge;
pub mod error;
pub mod manifest;
pub mod quality;
pub mod source;

pub use adapter::{EngineAdapter, EngineBinder};
pub use bridge::EventBridge;
pub use error::{PlaybackError, Result};
pub use manifest::{AdaptationSetSummary, ManifestSummary};
pub use quality::{AudioCodec, AudioQuality, QualityTier};
pub use source::{MediaSourceDescriptor, SourceKind, SourceResolver};
