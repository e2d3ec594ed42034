use std::sync::Arc;

use tokio::sync::watch;

/// Largest fraction reported while at least one task is still outstanding.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON;

// ---------------------------------------------------------------------------
// ProgressAggregator
// ---------------------------------------------------------------------------

/// Turns per-task byte counts into one progress fraction for a whole batch.
///
/// Completed tasks are accounted with their declared size, which corrects
/// whatever drift the in-flight byte counts had. The fraction never goes
/// backwards and is exactly `1.0` only once every task has completed.
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    total_bytes: u64,
    cumulative_loaded: u64,
    task_count: usize,
    completed_tasks: usize,
    last_fraction: f64,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all state for a batch of `task_count` files totalling
    /// `total_bytes`.
    pub fn begin_batch(&mut self, total_bytes: u64, task_count: usize) {
        *self = Self {
            total_bytes,
            task_count,
            ..Self::default()
        };
    }

    /// Records that the current task has loaded `task_loaded` bytes.
    pub fn on_progress(&mut self, task_loaded: u64) -> f64 {
        if self.is_complete() {
            return self.last_fraction;
        }
        let loaded = self
            .cumulative_loaded
            .saturating_add(task_loaded)
            .min(self.total_bytes);
        let fraction = self.ratio(loaded).min(BELOW_ONE);
        self.last_fraction = self.last_fraction.max(fraction);
        self.last_fraction
    }

    /// Records that a task of declared size `task_size` completed.
    pub fn on_task_complete(&mut self, task_size: u64) -> f64 {
        self.cumulative_loaded = self
            .cumulative_loaded
            .saturating_add(task_size)
            .min(self.total_bytes);
        self.completed_tasks = (self.completed_tasks + 1).min(self.task_count);

        if self.is_complete() {
            self.last_fraction = 1.0;
            return self.last_fraction;
        }
        self.on_progress(0)
    }

    /// Last reported fraction.
    pub fn fraction(&self) -> f64 {
        self.last_fraction
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes accounted for by completed tasks.
    pub fn cumulative_loaded(&self) -> u64 {
        self.cumulative_loaded
    }

    pub fn completed_tasks(&self) -> usize {
        self.completed_tasks
    }

    fn is_complete(&self) -> bool {
        self.task_count > 0 && self.completed_tasks >= self.task_count
    }

    fn ratio(&self, loaded: u64) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        loaded as f64 / self.total_bytes as f64
    }
}

// ---------------------------------------------------------------------------
// ProgressSink
// ---------------------------------------------------------------------------

/// Receiving half of a progress channel: the latest loaded byte count.
pub type ProgressReceiver = watch::Receiver<u64>;

/// Reporting half of a progress channel, handed to a transport.
///
/// Only increasing counts are published, so a receiver always observes a
/// non-decreasing sequence.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Arc<watch::Sender<u64>>,
}

impl ProgressSink {
    /// Publishes `loaded` if it is larger than the last published count.
    pub fn report(&self, loaded: u64) {
        self.tx.send_if_modified(|current| {
            if loaded > *current {
                *current = loaded;
                true
            } else {
                false
            }
        });
    }

    /// Last published count.
    pub fn loaded(&self) -> u64 {
        *self.tx.borrow()
    }
}

/// Creates a connected sink/receiver pair starting at zero.
pub fn progress_channel() -> (ProgressSink, ProgressReceiver) {
    let (tx, rx) = watch::channel(0);
    (ProgressSink { tx: Arc::new(tx) }, rx)
}
