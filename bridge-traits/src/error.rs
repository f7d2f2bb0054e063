use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The platform rejected a registration because the identifier is taken.
    #[error("Identifier already in use: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BridgeError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
