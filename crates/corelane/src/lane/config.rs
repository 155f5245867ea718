//! Configuration for a [`Lane`](crate::lane::Lane).

use std::time::{Duration, Instant};

/// What a [`Lane`](crate::lane::Lane) does when a submission arrives and its
/// bounded job queue is already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Reject immediately with [`LaneError::QueueFull`](crate::lane::LaneError::QueueFull).
    FailFast,
    /// Suspend the caller on an admission-waiters list; reject with
    /// [`LaneError::Overloaded`](crate::lane::LaneError::Overloaded) only once
    /// that list is itself full.
    Throw,
    /// Identical admission behavior to [`Throw`](Self::Throw): suspend the
    /// caller on the admission-waiters list, rejecting with `Overloaded` only
    /// once that list is full. Kept as a distinct variant so configuration
    /// expresses intent (bounded buffering vs. a soft, always-suspend policy)
    /// even though today both resolve to the same admission algorithm.
    Suspend,
}

/// When a submission to a [`Lane`](crate::lane::Lane) gives up on admission or
/// completion.
#[derive(Debug, Clone, Copy)]
pub enum Deadline {
    /// Wait indefinitely.
    None,
    /// Give up at this [`Instant`]. An instant already in the past means the
    /// call resolves immediately to whatever domain error applies, without
    /// ever touching the queue's wait paths.
    At(Instant),
}

impl Deadline {
    /// A deadline of "right now": admission and completion must already be
    /// possible, or the call resolves to a domain error immediately.
    #[must_use]
    pub fn now() -> Self {
        Self::At(Instant::now())
    }

    #[must_use]
    pub(crate) fn instant(self) -> Option<Instant> {
        match self {
            Self::None => None,
            Self::At(instant) => Some(instant),
        }
    }
}

/// What a [`Lane`](crate::lane::Lane) does when a caller submits with
/// [`Deadline::None`] (no deadline of their own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePolicy {
    /// Wait indefinitely, exactly as the caller asked.
    Unbounded,
    /// Substitute a deadline of `now + duration`, so no submission can wait
    /// forever even if its caller never supplied a deadline.
    CapAt(Duration),
}

impl DeadlinePolicy {
    pub(crate) fn apply(self, requested: Deadline) -> Deadline {
        match (self, requested) {
            (_, Deadline::At(instant)) => Deadline::At(instant),
            (Self::Unbounded, Deadline::None) => Deadline::None,
            (Self::CapAt(duration), Deadline::None) => Deadline::At(Instant::now() + duration),
        }
    }
}

/// Construction parameters for a [`Lane`](crate::lane::Lane).
#[derive(Debug, Clone)]
pub struct LaneConfig {
    pub(crate) worker_count: usize,
    pub(crate) queue_capacity: usize,
    pub(crate) admission_waiters_capacity: usize,
    pub(crate) backpressure: Backpressure,
    pub(crate) default_deadline: DeadlinePolicy,
    pub(crate) name: String,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_capacity: 64,
            admission_waiters_capacity: 256,
            backpressure: Backpressure::Throw,
            default_deadline: DeadlinePolicy::Unbounded,
            name: String::from("corelane-lane"),
        }
    }
}

impl LaneConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dedicated worker threads draining the job queue.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        assert!(worker_count > 0, "LaneConfig worker_count must be nonzero");
        self.worker_count = worker_count;
        self
    }

    /// Maximum number of jobs the lane holds at once, across admitted-but-not-
    /// yet-running and currently-running jobs.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        assert!(queue_capacity > 0, "LaneConfig queue_capacity must be nonzero");
        self.queue_capacity = queue_capacity;
        self
    }

    /// Maximum number of callers that may be suspended waiting for a free
    /// queue slot at once, under [`Backpressure::Throw`] or
    /// [`Backpressure::Suspend`].
    #[must_use]
    pub fn with_admission_waiters_capacity(mut self, admission_waiters_capacity: usize) -> Self {
        self.admission_waiters_capacity = admission_waiters_capacity;
        self
    }

    /// What to do when the job queue is full at submission time.
    #[must_use]
    pub fn with_backpressure(mut self, backpressure: Backpressure) -> Self {
        self.backpressure = backpressure;
        self
    }

    /// What deadline to apply when a caller submits with [`Deadline::None`].
    #[must_use]
    pub fn with_default_deadline(mut self, default_deadline: DeadlinePolicy) -> Self {
        self.default_deadline = default_deadline;
        self
    }

    /// Prefix for the lane's worker thread names.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
