//! Lock-free counters for executors and lanes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Running counters for a [`SerialExecutor`](crate::executor::SerialExecutor) or
/// [`ExecutorPool`](crate::executor::ExecutorPool).
///
/// All fields are independent atomics updated with `Relaxed` ordering: they are
/// diagnostic counters, not synchronization points, so callers must not infer
/// happens-before relationships between them.
#[derive(Debug, Default)]
pub struct ExecutorStats {
    jobs_submitted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_panicked: AtomicU64,
    jobs_rejected: AtomicU64,
    queue_depth: AtomicU64,
    total_execution_nanos: AtomicU64,
}

/// A point-in-time, `Copy` snapshot of an [`ExecutorStats`].
///
/// Cheap to take (one `Relaxed` load per field) and safe to pass around or log
/// without holding a reference into the live atomics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorStatsSnapshot {
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    pub jobs_panicked: u64,
    pub jobs_rejected: u64,
    pub queue_depth: u64,
    pub total_execution: Duration,
}

impl ExecutorStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submit(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dequeue(&self) {
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_complete(&self, execution_time: Duration) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        self.total_execution_nanos
            .fetch_add(u64::try_from(execution_time.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self, execution_time: Duration) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
        self.total_execution_nanos
            .fetch_add(u64::try_from(execution_time.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_reject(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn jobs_rejected(&self) -> u64 {
        self.jobs_rejected.load(Ordering::Relaxed)
    }

    /// Number of jobs currently enqueued but not yet dequeued by the run loop.
    #[must_use]
    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    /// Cumulative time spent actually running job closures (including ones
    /// that panicked), summed across every job this executor has run.
    #[must_use]
    pub fn total_execution_time(&self) -> Duration {
        Duration::from_nanos(self.total_execution_nanos.load(Ordering::Relaxed))
    }

    /// A cheap, `Copy` point-in-time view of every counter.
    #[must_use]
    pub fn snapshot(&self) -> ExecutorStatsSnapshot {
        ExecutorStatsSnapshot {
            jobs_submitted: self.jobs_submitted(),
            jobs_completed: self.jobs_completed(),
            jobs_panicked: self.jobs_panicked(),
            jobs_rejected: self.jobs_rejected(),
            queue_depth: self.queue_depth(),
            total_execution: self.total_execution_time(),
        }
    }
}

/// A point-in-time, `Copy` snapshot of a [`LaneStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneStatsSnapshot {
    pub admitted: u64,
    pub suspended_on_admission: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub deadline_exceeded: u64,
    pub rejected: u64,
    pub worker_panics: u64,
}

/// Running counters for a [`Lane`](crate::lane::Lane).
#[derive(Debug, Default)]
pub struct LaneStats {
    admitted: AtomicU64,
    suspended_on_admission: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    deadline_exceeded: AtomicU64,
    rejected: AtomicU64,
    worker_panics: AtomicU64,
}

impl LaneStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suspended_on_admission(&self) {
        self.suspended_on_admission.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deadline_exceeded(&self) {
        self.deadline_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_panic(&self) {
        self.worker_panics.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn suspended_on_admission(&self) -> u64 {
        self.suspended_on_admission.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn deadline_exceeded(&self) -> u64 {
        self.deadline_exceeded.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn worker_panics(&self) -> u64 {
        self.worker_panics.load(Ordering::Relaxed)
    }

    /// A cheap, `Copy` point-in-time view of every counter.
    #[must_use]
    pub fn snapshot(&self) -> LaneStatsSnapshot {
        LaneStatsSnapshot {
            admitted: self.admitted(),
            suspended_on_admission: self.suspended_on_admission(),
            completed: self.completed(),
            cancelled: self.cancelled(),
            deadline_exceeded: self.deadline_exceeded(),
            rejected: self.rejected(),
            worker_panics: self.worker_panics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_stats_start_at_zero() {
        let stats = ExecutorStats::new();
        assert_eq!(stats.jobs_submitted(), 0);
        assert_eq!(stats.jobs_completed(), 0);
        assert_eq!(stats.queue_depth(), 0);
        assert_eq!(stats.total_execution_time(), Duration::ZERO);
    }

    #[test]
    fn executor_stats_track_queue_depth_and_execution_time() {
        let stats = ExecutorStats::new();
        stats.record_submit();
        stats.record_submit();
        assert_eq!(stats.queue_depth(), 2);
        stats.record_dequeue();
        stats.record_complete(Duration::from_millis(5));
        assert_eq!(stats.queue_depth(), 1);
        assert_eq!(stats.jobs_completed(), 1);
        assert!(stats.total_execution_time() >= Duration::from_millis(5));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.jobs_submitted, 2);
        assert_eq!(snapshot.queue_depth, 1);
    }

    #[test]
    fn lane_stats_count_independently() {
        let stats = LaneStats::new();
        stats.record_admitted();
        stats.record_admitted();
        stats.record_cancelled();
        assert_eq!(stats.admitted(), 2);
        assert_eq!(stats.cancelled(), 1);
        assert_eq!(stats.completed(), 0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.admitted, 2);
        assert_eq!(snapshot.cancelled, 1);
        assert_eq!(snapshot.completed, 0);
    }
}
