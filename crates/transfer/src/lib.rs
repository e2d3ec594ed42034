//! Transfer primitives for the upload engine.
//!
//! - [`FileDescriptor`]: what gets uploaded (name, content, declared size)
//! - [`ProgressAggregator`]: one progress fraction across a whole batch
//! - [`ProgressSink`]: byte counts reported by a live transfer
//! - [`body_stream`]: chunked request body that feeds a [`ProgressSink`]

mod chunked;
mod progress;
mod types;

pub use chunked::{BodyStream, body_stream, split_chunks};
pub use progress::{ProgressAggregator, ProgressReceiver, ProgressSink, progress_channel};
pub use types::{FileContent, FileDescriptor, total_size};

/// Default body chunk size: 64 KiB.
///
/// Small enough for smooth progress on slow links, large enough to keep
/// per-chunk overhead negligible.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {0}")]
    NotAFile(String),

    #[error("invalid file name: {0}")]
    InvalidName(String),
}
