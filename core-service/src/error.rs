use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    /// A platform session with the generated identifier already exists.
    /// Playback continues without session integration.
    #[error("Session creation conflict: {0}")]
    SessionCreationConflict(String),

    /// Cover art could not be loaded. The notification renders without it.
    #[error("Image fetch failed: {0}")]
    ImageFetch(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    /// The command loop has exited; the handle is dead.
    #[error("Playback service stopped")]
    ServiceStopped,
}

impl ServiceError {
    /// Error code reported over the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Playback(e) => e.code(),
            ServiceError::SessionCreationConflict(_) => "SESSION_CONFLICT",
            ServiceError::ImageFetch(_) => "IMAGE_FETCH_ERROR",
            ServiceError::Runtime(_) => "RUNTIME_ERROR",
            ServiceError::ServiceStopped => "SERVICE_STOPPED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
