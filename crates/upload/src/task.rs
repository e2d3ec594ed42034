//! Transport seam and single-file upload task.
//!
//! `UploadTransport` is implemented by the HTTP client. Using a trait keeps
//! the pipeline decoupled from reqwest and testable with scripted mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use airlift_transfer::{FileDescriptor, ProgressSink, progress_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::{Classification, classify_upload};
use crate::error::UploadError;
use crate::types::{Locator, Origin, TransportResponse};

/// Performs one upload exchange.
pub trait UploadTransport: Send + Sync {
    /// Sends `file` to the upload route and returns the raw response.
    ///
    /// The filename travels in the filename header. Loaded byte counts are
    /// published through `progress` while the body streams. Dropping the
    /// returned future aborts the exchange.
    fn send_file<'a>(
        &'a self,
        file: &'a FileDescriptor,
        progress: ProgressSink,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, UploadError>> + Send + 'a>>;
}

/// Terminal state of one upload task.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(Locator),
    Failed(UploadError),
    AuthRequired,
    Cancelled,
}

/// Uploads one file at a time through a transport.
#[derive(Clone)]
pub struct UploadTask {
    transport: Arc<dyn UploadTransport>,
    origin: Origin,
    cancel: CancellationToken,
}

impl UploadTask {
    pub fn new(transport: Arc<dyn UploadTransport>, origin: Origin, cancel: CancellationToken) -> Self {
        Self {
            transport,
            origin,
            cancel,
        }
    }

    /// Uploads `file`, forwarding loaded byte counts to `on_progress`.
    ///
    /// Performs exactly one exchange, or none when the task was cancelled
    /// before dispatch. Cancellation during the exchange drops it and
    /// resolves as [`TaskOutcome::Cancelled`].
    pub async fn execute<F>(&self, file: &FileDescriptor, mut on_progress: F) -> TaskOutcome
    where
        F: FnMut(u64) + Send,
    {
        if self.cancel.is_cancelled() {
            debug!(file = %file.name(), "cancelled before dispatch");
            return TaskOutcome::Cancelled;
        }

        debug!(file = %file.name(), bytes = file.size(), "dispatching upload");
        let (sink, mut progress) = progress_channel();
        let exchange = self.transport.send_file(file, sink);
        tokio::pin!(exchange);

        let mut watching = true;
        let mut forwarded = 0;
        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!(file = %file.name(), "upload cancelled");
                    return TaskOutcome::Cancelled;
                }
                changed = progress.changed(), if watching => match changed {
                    Ok(()) => {
                        let loaded = *progress.borrow_and_update();
                        forwarded = loaded;
                        on_progress(loaded);
                    }
                    Err(_) => watching = false,
                },
                result = &mut exchange => break result,
            }
        };

        // The sink is gone once the exchange resolved, but its last count
        // is still readable.
        let loaded = *progress.borrow();
        if loaded > forwarded {
            on_progress(loaded);
        }

        let response = match result {
            Ok(response) => response,
            Err(UploadError::AuthRequired) => return TaskOutcome::AuthRequired,
            Err(e) => {
                warn!(file = %file.name(), error = %e, "upload exchange failed");
                return TaskOutcome::Failed(e);
            }
        };

        match classify_upload(response.status, &response.body) {
            Classification::Success(fragment) => {
                let locator = self.origin.compose(&fragment);
                debug!(file = %file.name(), locator = %locator, "upload stored");
                TaskOutcome::Completed(locator)
            }
            Classification::AuthRequired => {
                info!(file = %file.name(), status = response.status, "authentication required");
                TaskOutcome::AuthRequired
            }
            Classification::Failure(e) => {
                warn!(file = %file.name(), status = response.status, error = %e, "upload rejected");
                TaskOutcome::Failed(e)
            }
        }
    }
}
