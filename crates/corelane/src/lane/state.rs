//! Internal, lock-protected bookkeeping for a [`Lane`](crate::lane::Lane).

use std::collections::{HashMap, HashSet, VecDeque};

use tokio::sync::oneshot;

use crate::lane::error::LaneError;
use crate::lane::ticket::Ticket;

pub(crate) type JobBody<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;
pub(crate) type CompletionValue<T, E> = Result<T, LaneError<E>>;

/// A job that has already been admitted into the bounded queue, waiting for a
/// worker to dequeue it.
pub(crate) struct QueuedJob<T, E> {
    pub(crate) ticket: Ticket,
    pub(crate) body: JobBody<T, E>,
}

/// What a suspended submitter learns when a seat in the queue frees up (or the
/// lane shuts down while it is still waiting).
pub(crate) enum AdmissionSignal {
    Admitted,
    ShutdownInProgress,
}

/// Bookkeeping for one caller suspended on the admission-waiters list, i.e. one
/// whose job has not yet been placed in the bounded queue.
pub(crate) struct AdmissionWaiter<T, E> {
    pub(crate) body: Option<JobBody<T, E>>,
    pub(crate) signal: oneshot::Sender<AdmissionSignal>,
}

/// All lock-protected state for one [`Lane`](crate::lane::Lane).
///
/// A single [`std::sync::Mutex`] guards every field here together: the four maps
/// below only make sense as a consistent unit (a ticket moves between them in
/// lockstep), so splitting them across separate locks would just create new
/// races instead of removing contention that matters.
pub(crate) struct LaneState<T, E> {
    pub(crate) queue: VecDeque<QueuedJob<T, E>>,
    pub(crate) queue_capacity: usize,
    pub(crate) admission_order: VecDeque<Ticket>,
    pub(crate) admission_waiters: HashMap<Ticket, AdmissionWaiter<T, E>>,
    pub(crate) admission_waiters_capacity: usize,
    pub(crate) pending_completions: HashMap<Ticket, CompletionValue<T, E>>,
    pub(crate) completion_waiters: HashMap<Ticket, oneshot::Sender<CompletionValue<T, E>>>,
    pub(crate) abandoned: HashSet<Ticket>,
    /// Tickets whose job was still sitting in `queue` (never dequeued by a
    /// worker) when the lane shut down, and so will never actually run.
    /// `Lane::await_completion` checks this before registering a completion
    /// waiter, so a caller that hasn't reached that point yet still gets
    /// `ShutdownInProgress` instead of waiting forever for a job that was
    /// discarded out from under it.
    pub(crate) shutdown_drained: HashSet<Ticket>,
}

impl<T, E> LaneState<T, E> {
    pub(crate) fn new(queue_capacity: usize, admission_waiters_capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queue_capacity,
            admission_order: VecDeque::new(),
            admission_waiters: HashMap::new(),
            admission_waiters_capacity,
            pending_completions: HashMap::new(),
            completion_waiters: HashMap::new(),
            abandoned: HashSet::new(),
            shutdown_drained: HashSet::new(),
        }
    }

    pub(crate) fn queue_has_room(&self) -> bool {
        self.queue.len() < self.queue_capacity
    }

    pub(crate) fn admission_waiters_have_room(&self) -> bool {
        self.admission_waiters.len() < self.admission_waiters_capacity
    }

    /// Records a job's completion, resolving it to whichever of the three
    /// places a racing cancellation may have already left it in. This is the
    /// single authoritative "who won" decision point shared by worker
    /// completion and submitter cancellation/timeout.
    pub(crate) fn record_completion(&mut self, ticket: Ticket, value: CompletionValue<T, E>) {
        if self.abandoned.remove(&ticket) {
            return;
        }
        if let Some(tx) = self.completion_waiters.remove(&ticket) {
            let _ = tx.send(value);
            return;
        }
        self.pending_completions.insert(ticket, value);
    }
}
