use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt, stream};
use tokio_util::io::ReaderStream;
use tracing::trace;

use crate::progress::ProgressSink;
use crate::types::FileContent;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Request body produced by [`body_stream`].
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Splits `data` into slices of at most `chunk_size` bytes without copying.
///
/// A `chunk_size` of 0 uses [`DEFAULT_CHUNK_SIZE`].
pub fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = effective_chunk_size(chunk_size);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

/// Builds a chunked body for `content`.
///
/// Every chunk handed to the HTTP stack is added to a running total that is
/// published through `sink`. The count is approximate: a chunk is counted
/// when the client pulls it, not when the server acknowledges it.
pub async fn body_stream(
    content: &FileContent,
    chunk_size: usize,
    sink: ProgressSink,
) -> Result<BodyStream, TransferError> {
    let chunk_size = effective_chunk_size(chunk_size);

    let raw: BodyStream = match content {
        FileContent::Memory(data) => {
            Box::pin(stream::iter(split_chunks(data, chunk_size).into_iter().map(Ok)))
        }
        FileContent::Path(path) => {
            let file = tokio::fs::File::open(path).await?;
            Box::pin(ReaderStream::with_capacity(file, chunk_size))
        }
    };

    let mut loaded = 0u64;
    let counted = raw.inspect_ok(move |chunk| {
        loaded += chunk.len() as u64;
        trace!(bytes = loaded, "body chunk pulled");
        sink.report(loaded);
    });
    Ok(Box::pin(counted))
}

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}
