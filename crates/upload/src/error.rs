//! Upload error types.

use airlift_chain::ChainError;
use airlift_transfer::TransferError;

/// Errors produced while uploading or talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The exchange failed before a classifiable response arrived, or the
    /// response could not be understood.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication required")]
    AuthRequired,

    /// The server rejected the request with a message meant for the user.
    #[error("{message}")]
    Validation { status: u16, message: String },

    #[error("server returned status {status}")]
    Unknown { status: u16 },

    #[error("an upload batch is already active")]
    BatchActive,

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

impl UploadError {
    /// Status code of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } | Self::Unknown { status } => Some(*status),
            _ => None,
        }
    }
}
