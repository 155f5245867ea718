//! A dedicated-thread, strictly-FIFO job runner.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::stats::ExecutorStats;
use crate::thread::{spawn_named, ThreadHandle, ThreadSpawnError};

type Job = Box<dyn FnOnce() + Send>;

/// Why a job could not be submitted to a [`SerialExecutor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The executor has begun or finished shutting down; no more jobs are accepted.
    #[error("executor is shutting down")]
    Shutdown,
}

/// Construction parameters for a [`SerialExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub(crate) name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: String::from("corelane-serial-executor"),
        }
    }
}

impl ExecutorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// OS thread name for the executor's dedicated thread.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    cv: Condvar,
    running: AtomicBool,
    stats: ExecutorStats,
}

/// A single dedicated OS thread that runs submitted closures strictly in the
/// order they were submitted.
///
/// Jobs never run concurrently with each other: the next job is not dequeued
/// until the previous one (including any panic it raised) has finished. A panic
/// inside a job is caught and logged; it does not kill the executor thread or
/// affect jobs submitted after it.
pub struct SerialExecutor {
    shared: Arc<Shared>,
    handle: Option<ThreadHandle<()>>,
}

impl SerialExecutor {
    /// Spawns the executor's worker thread with default configuration.
    pub fn new() -> Result<Self, ThreadSpawnError> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Spawns the executor's worker thread under the given OS thread name.
    pub fn with_name(name: impl Into<String>) -> Result<Self, ThreadSpawnError> {
        Self::with_config(ExecutorConfig::default().with_name(name))
    }

    /// Spawns the executor's worker thread per `config`.
    pub fn with_config(config: ExecutorConfig) -> Result<Self, ThreadSpawnError> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
            running: AtomicBool::new(true),
            stats: ExecutorStats::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let handle = spawn_named(config.name, move || run_loop(&worker_shared))?;
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Running counters for this executor.
    #[must_use]
    pub fn stats(&self) -> &ExecutorStats {
        &self.shared.stats
    }

    /// Queues `job` to run after every job already queued, if the executor is
    /// still accepting work.
    pub fn submit<F>(&self, job: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.shared.running.load(Ordering::Acquire) {
            self.shared.stats.record_reject();
            return Err(SubmitError::Shutdown);
        }
        let mut queue = self.shared.queue.lock().unwrap();
        if !self.shared.running.load(Ordering::Acquire) {
            self.shared.stats.record_reject();
            return Err(SubmitError::Shutdown);
        }
        queue.push_back(Box::new(job));
        self.shared.stats.record_submit();
        drop(queue);
        self.shared.cv.notify_one();
        Ok(())
    }

    /// Stops accepting new jobs. Jobs already queued still run to completion.
    ///
    /// Idempotent: calling this more than once (or before [`join`](Self::join))
    /// has no additional effect.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.cv.notify_all();
    }

    /// Stops accepting new jobs and blocks until every already-queued job has run
    /// and the worker thread has exited.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join();
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if !shared.running.load(Ordering::Acquire) {
                    break None;
                }
                queue = shared.cv.wait(queue).unwrap();
            }
        };
        let Some(job) = job else {
            debug!("serial executor draining complete, exiting");
            return;
        };
        shared.stats.record_dequeue();
        trace!("serial executor running job");
        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => shared.stats.record_complete(started.elapsed()),
            Err(payload) => {
                shared.stats.record_panic(started.elapsed());
                warn!(panic = %panic_message(&payload), "job submitted to serial executor panicked");
            }
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
