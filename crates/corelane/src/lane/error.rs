//! Outcomes and errors produced by a [`Lane`](crate::lane::Lane).

use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// A lane's own failure modes, parameterized over the caller's domain error `E`.
///
/// These are the errors a submission can resolve to as an *ordinary outcome* —
/// distinct from [`LifecycleError::ShutdownInProgress`], which means the lane
/// itself is gone rather than that this particular submission failed.
#[derive(Debug, Error)]
pub enum LaneError<E: std::error::Error> {
    /// The bounded job queue was full and the lane's backpressure policy is
    /// configured to fail immediately rather than suspend the caller.
    #[error("lane queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },
    /// The job queue was full and the list of callers already waiting for a
    /// free slot is itself at capacity.
    #[error("lane is overloaded (admission waiters at capacity: {admission_waiters_capacity})")]
    Overloaded { admission_waiters_capacity: usize },
    /// The submission's deadline passed before it was admitted or completed.
    #[error("deadline exceeded while waiting for admission or completion")]
    DeadlineExceeded,
    /// The worker thread panicked while running the job.
    #[error("worker panicked while running job")]
    WorkerPanicked,
    /// The job itself ran and failed with a caller-defined error.
    #[error(transparent)]
    Domain(E),
}

/// What a [`Lane::run`](crate::lane::Lane::run) call resolves to when it does not
/// hit a lifecycle error.
///
/// Cancellation is deliberately a variant here rather than an error: a cancelled
/// submission did not fail, its caller simply stopped waiting for it, and no
/// partial resource ownership needs to be unwound as if something had gone wrong.
#[derive(Debug)]
pub enum Outcome<T, E: std::error::Error> {
    /// The job ran and returned a value.
    Success(T),
    /// The submission failed for a reason captured by [`LaneError`].
    Domain(LaneError<E>),
    /// The caller's cancellation signal fired before the job produced a result.
    Cancelled,
}

impl<T, E: std::error::Error> Outcome<T, E> {
    /// `true` iff this is [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `true` iff this is [`Outcome::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Converts into `Option<T>`, discarding the distinction between domain
    /// failure and cancellation.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// The result of submitting one job to a [`Lane`](crate::lane::Lane).
pub type LaneResult<T, E> = Result<Outcome<T, E>, LifecycleError<LaneError<E>>>;
