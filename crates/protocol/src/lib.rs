//! Wire protocol of the airlift server.
//!
//! Route paths, header names, status codes and the JSON bodies exchanged
//! with the server. Shared by the upload engine and the HTTP client so
//! neither has to hard-code strings.

pub mod constants;
pub mod filename;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::PurgeScope;
pub use filename::encode_filename;
pub use messages::{PruneCount, ServerResponse};

/// Errors produced while decoding protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
