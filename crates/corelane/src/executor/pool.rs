//! A sharded round-robin pool of [`SerialExecutor`]s.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::executor::serial::SerialExecutor;
use crate::thread::ThreadSpawnError;

/// Construction parameters for an [`ExecutorPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub(crate) name_prefix: String,
    pub(crate) size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let size = std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1).min(4);
        Self {
            name_prefix: String::from("corelane-executor-pool"),
            size,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for each executor's OS thread name (`{prefix}-{index}`).
    #[must_use]
    pub fn with_name_prefix(mut self, name_prefix: impl Into<String>) -> Self {
        self.name_prefix = name_prefix.into();
        self
    }

    /// Number of executors in the pool.
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// A fixed-size pool of independent [`SerialExecutor`]s.
///
/// Each executor preserves FIFO order among jobs submitted to *it*, but the pool
/// gives no ordering guarantee across executors. Use [`at`](Self::at) when callers
/// need the same key to always land on the same executor (e.g. to serialize work
/// for one logical resource); use [`next`](Self::next) for plain load spreading.
pub struct ExecutorPool {
    executors: Vec<SerialExecutor>,
    cursor: AtomicUsize,
}

impl ExecutorPool {
    /// Spawns `size` executors, each named `{name_prefix}-{index}`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(name_prefix: &str, size: usize) -> Result<Self, ThreadSpawnError> {
        Self::with_config(PoolConfig::new().with_name_prefix(name_prefix).with_size(size))
    }

    /// Spawns a pool per `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config.size` is zero.
    pub fn with_config(config: PoolConfig) -> Result<Self, ThreadSpawnError> {
        assert!(config.size > 0, "ExecutorPool size must be nonzero");
        let mut executors = Vec::with_capacity(config.size);
        for index in 0..config.size {
            executors.push(SerialExecutor::with_name(format!("{}-{index}", config.name_prefix))?);
        }
        Ok(Self {
            executors,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of executors in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.executors.len()
    }

    /// Returns the next executor in round-robin order.
    ///
    /// The rotation itself is a single relaxed fetch-add: under concurrent
    /// callers the exact assignment order is unspecified, only that work is
    /// spread roughly evenly across executors.
    #[must_use]
    pub fn next(&self) -> &SerialExecutor {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.executors.len();
        &self.executors[index]
    }

    /// Returns the executor pinned to `key` (via `key % size`), so that repeated
    /// calls with the same `key` deterministically land on the same executor.
    #[must_use]
    pub fn at(&self, key: usize) -> &SerialExecutor {
        &self.executors[key % self.executors.len()]
    }

    /// Stops accepting new jobs on every executor in the pool. Jobs already
    /// queued still run to completion.
    pub fn shutdown(&self) {
        for executor in &self.executors {
            executor.shutdown();
        }
    }

    /// Stops accepting new jobs and blocks until every executor has drained and
    /// its thread has exited.
    pub fn join(self) {
        for executor in self.executors {
            executor.join();
        }
    }
}
