//! The blocking lane: a deadline-aware, backpressure-bounded bridge between
//! async callers and a small pool of dedicated OS worker threads.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::lane::config::{Backpressure, Deadline, DeadlinePolicy, LaneConfig};
use crate::lane::error::{LaneError, LaneResult, Outcome};
use crate::lane::state::{AdmissionSignal, AdmissionWaiter, CompletionValue, JobBody, LaneState, QueuedJob};
use crate::lane::ticket::{Ticket, TicketGenerator};
use crate::lifecycle::LifecycleError;
use crate::stats::LaneStats;
use crate::worker::{StopToken, Worker};

const RUNNING: u8 = 0;
const SHUTDOWN_IN_PROGRESS: u8 = 1;
const SHUTDOWN_COMPLETE: u8 = 2;

struct Shared<T, E: std::error::Error> {
    state: Mutex<LaneState<T, E>>,
    cv: Condvar,
    lifecycle: AtomicU8,
    tickets: TicketGenerator,
    stats: LaneStats,
    backpressure: Backpressure,
    default_deadline: DeadlinePolicy,
}

/// A bounded, deadline-aware bridge from async callers to a pool of dedicated
/// OS worker threads.
///
/// Each [`run`](Self::run) call submits one job and awaits its outcome without
/// blocking the calling task's executor: admission (getting a seat in the
/// bounded job queue) and completion (the job actually finishing) are each
/// awaited independently, and either stage can resolve early via the caller's
/// [`CancellationToken`] or [`Deadline`]. Cancellation surfaces as
/// [`Outcome::Cancelled`], never as an error: a cancelled caller simply stopped
/// waiting, nothing failed.
pub struct Lane<T, E: std::error::Error + Send + 'static>
where
    T: Send + 'static,
{
    shared: Arc<Shared<T, E>>,
    workers: Vec<Worker>,
}

impl<T, E> Lane<T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    /// Spawns the lane's worker threads per `config`.
    pub fn new(config: LaneConfig) -> Result<Self, crate::thread::ThreadSpawnError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(LaneState::new(config.queue_capacity, config.admission_waiters_capacity)),
            cv: Condvar::new(),
            lifecycle: AtomicU8::new(RUNNING),
            tickets: TicketGenerator::new(),
            stats: LaneStats::new(),
            backpressure: config.backpressure,
            default_deadline: config.default_deadline,
        });

        let mut workers = Vec::with_capacity(config.worker_count);
        for index in 0..config.worker_count {
            let worker_shared = Arc::clone(&shared);
            let worker = Worker::start(format!("{}-{index}", config.name), move |stop| {
                worker_loop(&worker_shared, stop);
            })?;
            workers.push(worker);
        }

        Ok(Self { shared, workers })
    }

    /// Running counters for this lane.
    #[must_use]
    pub fn stats(&self) -> &LaneStats {
        &self.shared.stats
    }

    /// Submits `body` and awaits its outcome, subject to `deadline` and
    /// `cancel`.
    pub async fn run<F>(&self, deadline: Deadline, cancel: &CancellationToken, body: F) -> LaneResult<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        if self.shared.lifecycle.load(Ordering::Acquire) != RUNNING {
            return Err(LifecycleError::ShutdownInProgress);
        }
        let deadline = self.shared.default_deadline.apply(deadline);

        let ticket = self.shared.tickets.next();
        let body: JobBody<T, E> = Box::new(body);

        let pending_rx = {
            let mut state = self.shared.state.lock().unwrap();
            if self.shared.lifecycle.load(Ordering::Acquire) != RUNNING {
                return Err(LifecycleError::ShutdownInProgress);
            }
            if state.queue_has_room() {
                state.queue.push_back(QueuedJob { ticket, body });
                drop(state);
                self.shared.cv.notify_one();
                self.shared.stats.record_admitted();
                None
            } else {
                match self.shared.backpressure {
                    Backpressure::FailFast => {
                        let capacity = state.queue_capacity;
                        drop(state);
                        self.shared.stats.record_rejected();
                        return Ok(Outcome::Domain(LaneError::QueueFull { capacity }));
                    }
                    Backpressure::Throw | Backpressure::Suspend => {
                        if !state.admission_waiters_have_room() {
                            let admission_waiters_capacity = state.admission_waiters_capacity;
                            drop(state);
                            self.shared.stats.record_rejected();
                            return Ok(Outcome::Domain(LaneError::Overloaded { admission_waiters_capacity }));
                        }
                        let (signal_tx, signal_rx) = oneshot::channel();
                        state.admission_waiters.insert(
                            ticket,
                            AdmissionWaiter {
                                body: Some(body),
                                signal: signal_tx,
                            },
                        );
                        state.admission_order.push_back(ticket);
                        drop(state);
                        self.shared.stats.record_suspended_on_admission();
                        Some(signal_rx)
                    }
                }
            }
        };

        if let Some(mut signal_rx) = pending_rx {
            tokio::select! {
                signal = &mut signal_rx => {
                    match signal {
                        Ok(AdmissionSignal::Admitted) => {}
                        _ => return Err(LifecycleError::ShutdownInProgress),
                    }
                }
                () = cancel.cancelled() => {
                    if self.claim_admission_waiter(ticket) {
                        self.shared.stats.record_cancelled();
                        return Ok(Outcome::Cancelled);
                    }
                    match (&mut signal_rx).await {
                        Ok(AdmissionSignal::Admitted) => {}
                        _ => return Err(LifecycleError::ShutdownInProgress),
                    }
                }
                () = deadline_future(deadline.instant()) => {
                    if self.claim_admission_waiter(ticket) {
                        self.shared.stats.record_deadline_exceeded();
                        return Ok(Outcome::Domain(LaneError::DeadlineExceeded));
                    }
                    match (&mut signal_rx).await {
                        Ok(AdmissionSignal::Admitted) => {}
                        _ => return Err(LifecycleError::ShutdownInProgress),
                    }
                }
            }
        }

        self.await_completion(ticket, deadline, cancel).await
    }

    /// Equivalent to `run(Deadline::now(), cancel, body)`: the call must be
    /// admitted and completed without ever actually suspending, or it resolves
    /// to a domain error immediately.
    pub async fn run_immediate<F>(&self, cancel: &CancellationToken, body: F) -> LaneResult<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.run(Deadline::now(), cancel, body).await
    }

    async fn await_completion(&self, ticket: Ticket, deadline: Deadline, cancel: &CancellationToken) -> LaneResult<T, E> {
        let (tx, mut rx) = oneshot::channel::<CompletionValue<T, E>>();
        let already = {
            let mut state = self.shared.state.lock().unwrap();
            if state.shutdown_drained.remove(&ticket) {
                return Err(LifecycleError::ShutdownInProgress);
            }
            if let Some(value) = state.pending_completions.remove(&ticket) {
                Some(value)
            } else {
                state.completion_waiters.insert(ticket, tx);
                None
            }
        };
        if let Some(value) = already {
            return Ok(self.resolve_completion(value));
        }

        tokio::select! {
            result = &mut rx => {
                match result {
                    Ok(value) => Ok(self.resolve_completion(value)),
                    Err(_) => Err(LifecycleError::ShutdownInProgress),
                }
            }
            () = cancel.cancelled() => {
                if self.claim_completion_waiter(ticket) {
                    self.shared.stats.record_cancelled();
                    Ok(Outcome::Cancelled)
                } else {
                    match rx.await {
                        Ok(value) => Ok(self.resolve_completion(value)),
                        Err(_) => Err(LifecycleError::ShutdownInProgress),
                    }
                }
            }
            () = deadline_future(deadline.instant()) => {
                if self.claim_completion_waiter(ticket) {
                    self.shared.stats.record_deadline_exceeded();
                    Ok(Outcome::Domain(LaneError::DeadlineExceeded))
                } else {
                    match rx.await {
                        Ok(value) => Ok(self.resolve_completion(value)),
                        Err(_) => Err(LifecycleError::ShutdownInProgress),
                    }
                }
            }
        }
    }

    /// Attempts to remove `ticket` from the admission-waiters list before it
    /// is promoted into the queue. Returns `true` if this call won that race.
    fn claim_admission_waiter(&self, ticket: Ticket) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.admission_waiters.remove(&ticket).is_some() {
            state.admission_order.retain(|t| *t != ticket);
            true
        } else {
            false
        }
    }

    /// Attempts to mark `ticket` abandoned before a worker records its
    /// completion. Returns `true` if this call won that race.
    fn claim_completion_waiter(&self, ticket: Ticket) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.completion_waiters.remove(&ticket).is_some() {
            state.abandoned.insert(ticket);
            true
        } else {
            false
        }
    }

    fn resolve_completion(&self, value: CompletionValue<T, E>) -> Outcome<T, E> {
        match value {
            Ok(v) => {
                self.shared.stats.record_completed();
                Outcome::Success(v)
            }
            Err(LaneError::WorkerPanicked) => {
                self.shared.stats.record_worker_panic();
                Outcome::Domain(LaneError::WorkerPanicked)
            }
            Err(other) => Outcome::Domain(other),
        }
    }

    /// Stops accepting new submissions. Callers already suspended on the
    /// admission-waiters list are woken with
    /// [`LifecycleError::ShutdownInProgress`]. A job already dequeued by a
    /// worker and running keeps running and still delivers its real outcome;
    /// a job still sitting in the bounded queue (never dequeued) is drained
    /// and its submitter is woken with `ShutdownInProgress` instead of being
    /// left to wait for a result that will never arrive.
    pub fn shutdown(&self) {
        if self.shared.lifecycle.swap(SHUTDOWN_IN_PROGRESS, Ordering::AcqRel) == SHUTDOWN_IN_PROGRESS {
            return;
        }
        let mut state = self.shared.state.lock().unwrap();
        for ticket in state.admission_order.drain(..) {
            if let Some(waiter) = state.admission_waiters.remove(&ticket) {
                let _ = waiter.signal.send(AdmissionSignal::ShutdownInProgress);
            }
        }
        let drained_tickets: Vec<Ticket> = state.queue.drain(..).map(|queued| queued.ticket).collect();
        for ticket in drained_tickets {
            if let Some(tx) = state.completion_waiters.remove(&ticket) {
                // Dropping the sender without sending turns the awaiting
                // receiver into a RecvError, which `await_completion` already
                // maps to `ShutdownInProgress`.
                drop(tx);
            } else {
                state.shutdown_drained.insert(ticket);
            }
        }
        drop(state);
        self.shared.cv.notify_all();
    }

    /// Stops accepting new submissions and blocks until every worker thread
    /// has drained the queue and exited.
    pub fn join(mut self) {
        self.shutdown();
        for worker in self.workers.drain(..) {
            worker.join();
        }
        self.shared.lifecycle.store(SHUTDOWN_COMPLETE, Ordering::Release);
        debug!("lane shut down");
    }
}

impl<T, E> Drop for Lane<T, E>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn deadline_future(deadline: Option<Instant>) {
    match deadline {
        Some(instant) => tokio::time::sleep_until(tokio::time::Instant::from_std(instant)).await,
        None => std::future::pending::<()>().await,
    }
}

fn worker_loop<T, E>(shared: &Shared<T, E>, stop: &StopToken)
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                // Checked before popping, not only once the queue is empty: a
                // job that is still queued (never dequeued) when shutdown
                // begins must be drained as a lifecycle failure, not started.
                if shared.lifecycle.load(Ordering::Acquire) != RUNNING || stop.should_stop() {
                    break None;
                }
                if let Some(job) = state.queue.pop_front() {
                    if let Some(next_ticket) = state.admission_order.pop_front() {
                        if let Some(waiter) = state.admission_waiters.remove(&next_ticket) {
                            if let Some(body) = waiter.body {
                                state.queue.push_back(QueuedJob { ticket: next_ticket, body });
                                let _ = waiter.signal.send(AdmissionSignal::Admitted);
                            }
                        }
                    }
                    break Some(job);
                }
                state = shared.cv.wait(state).unwrap();
            }
        };
        let Some(job) = job else {
            trace!("lane worker exiting, queue drained");
            return;
        };
        shared.cv.notify_one();

        let QueuedJob { ticket, body } = job;
        let outcome: CompletionValue<T, E> = match catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(domain_err)) => Err(LaneError::Domain(domain_err)),
            Err(_payload) => Err(LaneError::WorkerPanicked),
        };

        let mut state = shared.state.lock().unwrap();
        state.record_completion(ticket, outcome);
    }
}
