//! # Playback Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors surfaced by the playback command surface.
///
/// Only caller mistakes and synchronous engine rejections show up here.
/// Failures the engine discovers later (network, decoding) arrive as
/// `error` events instead.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The source reference is empty or malformed. Rejected before any
    /// engine interaction.
    #[error("Invalid source reference: {0}")]
    InvalidSource(String),

    /// An argument is out of range (e.g. a negative seek position).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine could not be constructed. Playback stays unavailable until
    /// the next attempt.
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// The engine rejected the media source. The previous source, if any,
    /// is still attached.
    #[error("Failed to set media source: {0}")]
    Source(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Errors caused by what the caller passed in.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidSource(_) | PlaybackError::InvalidArgument(_)
        )
    }

    /// Errors raised by the engine or its host bridge.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::EngineInit(_) | PlaybackError::Source(_) | PlaybackError::Bridge(_)
        )
    }

    /// Stable error code reported over the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::InvalidSource(_) => "INVALID_SOURCE",
            PlaybackError::InvalidArgument(_) => "INVALID_ARGUMENT",
            PlaybackError::EngineInit(_) => "ENGINE_INIT_ERROR",
            PlaybackError::Source(_) | PlaybackError::Bridge(_) => "SOURCE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let invalid = PlaybackError::InvalidSource("".to_string());
        assert!(invalid.is_caller_error());
        assert!(!invalid.is_engine_error());
        assert_eq!(invalid.code(), "INVALID_SOURCE");

        let seek = PlaybackError::InvalidArgument("position -5".to_string());
        assert!(seek.is_caller_error());
        assert_eq!(seek.code(), "INVALID_ARGUMENT");

        let init = PlaybackError::EngineInit("no decoder".to_string());
        assert!(init.is_engine_error());
        assert_eq!(init.code(), "ENGINE_INIT_ERROR");

        let bridge: PlaybackError = BridgeError::OperationFailed("boom".to_string()).into();
        assert!(bridge.is_engine_error());
        assert_eq!(bridge.code(), "SOURCE_ERROR");
    }
}
