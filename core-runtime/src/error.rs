//! Errors raised while assembling the playback runtime.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("Invalid playback configuration: {0}")]
    Config(String),

    /// A required host capability was not supplied and has no default.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A bundled default capability could not be constructed.
    #[error("Default {capability} failed to initialize: {message}")]
    DefaultCapability {
        capability: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
