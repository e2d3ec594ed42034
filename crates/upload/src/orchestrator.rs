//! Batch orchestrator and cancellation controller.
//!
//! Builds one [`TaskChain`] step per file, runs the files strictly one at a
//! time, aggregates progress across the batch and reports the ordered
//! locators or the first stop reason.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use airlift_chain::{StepFailure, TaskChain};
use airlift_transfer::{FileDescriptor, ProgressAggregator, total_size};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::UploadError;
use crate::task::{TaskOutcome, UploadTask, UploadTransport};
use crate::types::{BatchOutcome, Locator, Origin, UploadEvent};

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Value carried from step to step.
struct BatchState {
    locators: Vec<Locator>,
    progress: ProgressAggregator,
}

/// Why a step stopped the chain.
enum StepStop {
    Failed(UploadError),
    AuthRequired,
    Cancelled,
}

/// Runs upload batches against one transport, one batch at a time.
pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    origin: Origin,
    active: Arc<AtomicBool>,
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
}

impl UploadOrchestrator {
    /// Creates an orchestrator whose locators are composed with `origin`.
    pub fn new(transport: Arc<dyn UploadTransport>, origin: Origin) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            origin,
            active: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Whether a batch currently holds the active slot.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Prepares a batch for `files`.
    ///
    /// Fails with [`UploadError::BatchActive`] while another batch of this
    /// orchestrator has not finished or been dropped.
    pub fn begin(&self, files: Vec<FileDescriptor>) -> Result<Batch, UploadError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("upload batch requested while another one is active");
            return Err(UploadError::BatchActive);
        }
        let slot = ActiveSlot(Arc::clone(&self.active));

        let id = NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let task = UploadTask::new(Arc::clone(&self.transport), self.origin.clone(), cancel.clone());

        let file_count = files.len();
        let total_bytes = total_size(&files);
        let mut progress = ProgressAggregator::new();
        progress.begin_batch(total_bytes, file_count);

        let chain = TaskChain::<BatchState, StepStop>::new();
        for (index, file) in files.into_iter().enumerate() {
            let task = task.clone();
            let events = self.events_tx.clone();
            chain.append(move |state| upload_step(id, index, file, task, events, state))?;
        }

        debug!(batch = id, files = file_count, bytes = total_bytes, "upload batch prepared");
        Ok(Batch {
            id,
            file_count,
            total_bytes,
            chain,
            initial: BatchState {
                locators: Vec::with_capacity(file_count),
                progress,
            },
            cancel,
            events: self.events_tx.clone(),
            slot,
        })
    }
}

/// One step of the batch chain: upload file `index` and account for it.
async fn upload_step(
    batch: u64,
    index: usize,
    file: FileDescriptor,
    task: UploadTask,
    events: mpsc::UnboundedSender<UploadEvent>,
    mut state: BatchState,
) -> Result<BatchState, StepStop> {
    let outcome = {
        let progress = &mut state.progress;
        let events = &events;
        task.execute(&file, |loaded| {
            let fraction = progress.on_progress(loaded);
            let _ = events.send(UploadEvent::Progress { batch, fraction });
        })
        .await
    };

    match outcome {
        TaskOutcome::Completed(locator) => {
            let fraction = state.progress.on_task_complete(file.size());
            let _ = events.send(UploadEvent::Progress { batch, fraction });
            let _ = events.send(UploadEvent::FileCompleted {
                batch,
                index,
                name: file.name().to_string(),
                locator: locator.clone(),
            });
            info!(batch, index, file = %file.name(), locator = %locator, "file uploaded");
            state.locators.push(locator);
            Ok(state)
        }
        TaskOutcome::Failed(e) => Err(StepStop::Failed(e)),
        TaskOutcome::AuthRequired => Err(StepStop::AuthRequired),
        TaskOutcome::Cancelled => Err(StepStop::Cancelled),
    }
}

/// Clears the orchestrator's active flag when dropped.
struct ActiveSlot(Arc<AtomicBool>);

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One upload session: the files, their chain, progress and cancel handle.
///
/// Consumed by [`run`](Self::run). Dropping a batch without running it
/// frees the orchestrator for the next one.
pub struct Batch {
    id: u64,
    file_count: usize,
    total_bytes: u64,
    chain: TaskChain<'static, BatchState, StepStop>,
    initial: BatchState,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<UploadEvent>,
    slot: ActiveSlot,
}

impl Batch {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Handle that cancels this batch from anywhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel.clone(),
        }
    }

    /// Uploads every file in order and reports how the batch ended.
    pub async fn run(self) -> BatchOutcome {
        let Batch {
            id,
            file_count,
            total_bytes,
            mut chain,
            initial,
            cancel: _,
            events,
            slot,
        } = self;

        info!(batch = id, files = file_count, bytes = total_bytes, "upload batch started");
        let _ = events.send(UploadEvent::Started {
            batch: id,
            files: file_count,
            total_bytes,
        });

        let outcome = match chain.run(initial).await {
            Ok(Ok(state)) => BatchOutcome::Completed(state.locators),
            Ok(Err(StepFailure { at, error })) => match error {
                StepStop::Failed(e) => {
                    error!(batch = id, index = at, error = %e, "upload batch failed");
                    BatchOutcome::Failed(e)
                }
                StepStop::AuthRequired => {
                    info!(batch = id, index = at, "upload batch needs authentication");
                    BatchOutcome::AuthRequired
                }
                StepStop::Cancelled => {
                    info!(batch = id, index = at, "upload batch cancelled");
                    BatchOutcome::Cancelled
                }
            },
            Err(e) => BatchOutcome::Failed(e.into()),
        };

        if let BatchOutcome::Completed(locators) = &outcome {
            info!(batch = id, files = locators.len(), "upload batch completed");
        }

        drop(slot);
        let _ = events.send(UploadEvent::Finished {
            batch: id,
            summary: outcome.summary(),
        });
        outcome
    }
}

/// Cancels a batch. Cloneable and idempotent; a no-op once the batch ended.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Aborts the live transfer and prevents any later file from starting.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
