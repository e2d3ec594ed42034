//! Sequential async task chain.
//!
//! A [`TaskChain`] is an ordered list of async steps. Each step receives the
//! value produced by the previous one and either proceeds (`Ok`) with a new
//! carried value or fails (`Err`). Steps run strictly in registration order
//! and a step never starts before the previous one has proceeded.
//!
//! The first failure makes the chain terminal: no further step runs and the
//! single registered error handler receives the error exactly once. A chain
//! without a handler drops the error.
//!
//! Steps can be appended while the chain runs, through a [`ChainHandle`].
//!
//! ```ignore
//! let mut chain = TaskChain::new()
//!     .then(|n: u32| async move { Ok::<_, String>(n + 1) })
//!     .then(|n| async move { Ok(n * 2) })
//!     .catch(|err| eprintln!("chain failed: {err}"));
//! assert_eq!(chain.start(1).await?, ChainOutcome::Completed(4));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

/// Boxed future returned by a chain step.
pub type StepFuture<'a, A, E> = Pin<Box<dyn Future<Output = Result<A, E>> + Send + 'a>>;

type Step<'a, A, E> = Box<dyn FnOnce(A) -> StepFuture<'a, A, E> + Send + 'a>;
type ErrorHandler<'a, E> = Box<dyn FnOnce(E) + Send + 'a>;

/// Lifecycle of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Built but not started.
    Pending,
    /// A step is executing. Steps may still be appended.
    Running,
    /// Every step proceeded.
    Completed,
    /// A step failed; the cursor is frozen.
    Failed,
}

impl ChainState {
    /// Whether the chain can no longer run any step.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// How a started chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome<A> {
    /// All steps proceeded; carries the value produced by the last step.
    Completed(A),
    /// The step at index `at` failed. The error went to the handler.
    Failed { at: usize },
}

/// The failing step of a chain driven with [`TaskChain::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure<E> {
    /// Index of the step that failed.
    pub at: usize,
    pub error: E,
}

/// Misuse of a chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("chain already started")]
    AlreadyStarted,

    #[error("chain already finished")]
    Finished,
}

/// Steps not yet run, shared between a chain and its handles.
struct Queue<'a, A, E> {
    steps: VecDeque<Step<'a, A, E>>,
    len: usize,
    state: ChainState,
}

type SharedQueue<'a, A, E> = Arc<Mutex<Queue<'a, A, E>>>;

fn lock<'q, 'a, A, E>(queue: &'q SharedQueue<'a, A, E>) -> MutexGuard<'q, Queue<'a, A, E>> {
    // No step runs while the lock is held, so a poisoned lock still holds
    // a consistent queue.
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push_step<'a, A, E, F, Fut>(queue: &SharedQueue<'a, A, E>, step: F) -> Result<(), ChainError>
where
    F: FnOnce(A) -> Fut + Send + 'a,
    Fut: Future<Output = Result<A, E>> + Send + 'a,
{
    let mut queue = lock(queue);
    if queue.state.is_terminal() {
        return Err(ChainError::Finished);
    }
    queue
        .steps
        .push_back(Box::new(move |value| Box::pin(step(value)) as StepFuture<'a, A, E>));
    queue.len += 1;
    Ok(())
}

/// Cloneable handle that appends steps to a chain, including while it runs.
///
/// A step may capture a handle to its own chain and extend it; the new step
/// runs after every step registered before it.
pub struct ChainHandle<'a, A, E> {
    queue: SharedQueue<'a, A, E>,
}

impl<A, E> Clone for ChainHandle<'_, A, E> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<'a, A, E> ChainHandle<'a, A, E> {
    /// Adds a step at the end of an unstarted or running chain.
    pub fn append<F, Fut>(&self, step: F) -> Result<(), ChainError>
    where
        F: FnOnce(A) -> Fut + Send + 'a,
        Fut: Future<Output = Result<A, E>> + Send + 'a,
    {
        push_step(&self.queue, step)
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> ChainState {
        lock(&self.queue).state
    }
}

/// Ordered async steps carrying a value of type `A`, failing with `E`.
pub struct TaskChain<'a, A, E> {
    queue: SharedQueue<'a, A, E>,
    cursor: usize,
    on_error: Option<ErrorHandler<'a, E>>,
}

impl<A, E> Default for TaskChain<'_, A, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A, E> TaskChain<'a, A, E> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(Queue {
                steps: VecDeque::new(),
                len: 0,
                state: ChainState::Pending,
            })),
            cursor: 0,
            on_error: None,
        }
    }

    /// Handle for appending steps once `start` holds the chain.
    pub fn handle(&self) -> ChainHandle<'a, A, E> {
        ChainHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Adds a step at the end of the chain (builder form of [`append`](Self::append)).
    ///
    /// Steps added to a finished chain are discarded with a warning.
    pub fn then<F, Fut>(self, step: F) -> Self
    where
        F: FnOnce(A) -> Fut + Send + 'a,
        Fut: Future<Output = Result<A, E>> + Send + 'a,
    {
        if self.append(step).is_err() {
            warn!("step added to a finished chain was discarded");
        }
        self
    }

    /// Adds a step at the end of an unstarted or running chain.
    ///
    /// Fails with [`ChainError::Finished`] once the chain is terminal.
    pub fn append<F, Fut>(&self, step: F) -> Result<(), ChainError>
    where
        F: FnOnce(A) -> Fut + Send + 'a,
        Fut: Future<Output = Result<A, E>> + Send + 'a,
    {
        push_step(&self.queue, step)
    }

    /// Registers the terminal error handler (builder form).
    pub fn catch<H>(mut self, handler: H) -> Self
    where
        H: FnOnce(E) + Send + 'a,
    {
        self.set_error_handler(handler);
        self
    }

    /// Registers the terminal error handler, replacing any previous one.
    pub fn set_error_handler<H>(&mut self, handler: H)
    where
        H: FnOnce(E) + Send + 'a,
    {
        self.on_error = Some(Box::new(handler));
    }

    /// Number of registered steps, run or not.
    pub fn len(&self) -> usize {
        lock(&self.queue).len
    }

    /// Whether no step was registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of steps that proceeded. Frozen once the chain failed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChainState {
        lock(&self.queue).state
    }

    /// Runs every step in order, starting from `initial`.
    ///
    /// May be called once. Steps appended while the chain runs are picked up
    /// in order. The returned future resolves when no step is left or when a
    /// step failed (after the error handler ran).
    pub async fn start(&mut self, initial: A) -> Result<ChainOutcome<A>, ChainError> {
        Ok(match self.run(initial).await? {
            Ok(value) => ChainOutcome::Completed(value),
            Err(StepFailure { at, error }) => {
                self.report(error);
                ChainOutcome::Failed { at }
            }
        })
    }

    /// Like [`start`](Self::start), but hands the failure back to the caller
    /// instead of the error handler, which is left untouched.
    pub async fn run(&mut self, initial: A) -> Result<Result<A, StepFailure<E>>, ChainError> {
        {
            let mut queue = lock(&self.queue);
            if queue.state != ChainState::Pending {
                return Err(ChainError::AlreadyStarted);
            }
            queue.state = ChainState::Running;
        }

        let mut value = initial;
        loop {
            let next = {
                let mut queue = lock(&self.queue);
                match queue.steps.pop_front() {
                    Some(step) => step,
                    None => {
                        queue.state = ChainState::Completed;
                        break;
                    }
                }
            };

            trace!(step = self.cursor, "running chain step");
            match next(value).await {
                Ok(produced) => {
                    self.cursor += 1;
                    value = produced;
                }
                Err(error) => {
                    let mut queue = lock(&self.queue);
                    queue.state = ChainState::Failed;
                    queue.steps.clear();
                    return Ok(Err(StepFailure {
                        at: self.cursor,
                        error,
                    }));
                }
            }
        }

        Ok(Ok(value))
    }

    /// Hands `err` to the handler. The handler is taken on first use, so
    /// later failures are no-ops.
    fn report(&mut self, err: E) {
        match self.on_error.take() {
            Some(handler) => handler(err),
            None => debug!(step = self.cursor, "chain failed without an error handler"),
        }
    }
}

impl<A, E> fmt::Debug for TaskChain<'_, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (len, state) = {
            let queue = lock(&self.queue);
            (queue.len, queue.state)
        };
        f.debug_struct("TaskChain")
            .field("len", &len)
            .field("cursor", &self.cursor)
            .field("state", &state)
            .field("has_error_handler", &self.on_error.is_some())
            .finish()
    }
}
