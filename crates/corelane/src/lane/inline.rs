//! A lane-shaped wrapper with no dedicated worker threads of its own.

use tokio_util::sync::CancellationToken;

use crate::lane::config::Deadline;
use crate::lane::error::{LaneError, LaneResult, Outcome};
use crate::lifecycle::LifecycleError;

/// Runs jobs on [`tokio`]'s own blocking thread pool instead of a dedicated
/// [`Lane`](crate::lane::Lane) worker pool.
///
/// `InlineLane` exposes the same [`Outcome`]/[`LaneError`] surface as [`Lane`]
/// so callers can swap between the two, but it has no bounded queue and no
/// backpressure: every call spawns its own blocking task, bounded only by
/// `tokio`'s own blocking-pool limits. Useful for tests and for call sites
/// with too little traffic to justify dedicating threads to them.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineLane;

impl InlineLane {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs `body` on a blocking task, subject to `deadline` and `cancel`.
    pub async fn run<T, E, F>(&self, deadline: Deadline, cancel: &CancellationToken, body: F) -> LaneResult<T, E>
    where
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let join = tokio::task::spawn_blocking(body);

        let timed = match deadline.instant() {
            Some(instant) => {
                let sleep_duration = instant.saturating_duration_since(std::time::Instant::now());
                tokio::select! {
                    result = join => Some(result),
                    () = cancel.cancelled() => None,
                    () = tokio::time::sleep(sleep_duration) => {
                        return Ok(Outcome::Domain(LaneError::DeadlineExceeded));
                    }
                }
            }
            None => {
                tokio::select! {
                    result = join => Some(result),
                    () = cancel.cancelled() => None,
                }
            }
        };

        match timed {
            Some(Ok(Ok(value))) => Ok(Outcome::Success(value)),
            Some(Ok(Err(domain_err))) => Ok(Outcome::Domain(LaneError::Domain(domain_err))),
            Some(Err(join_err)) if join_err.is_panic() => Ok(Outcome::Domain(LaneError::WorkerPanicked)),
            Some(Err(_cancelled)) => Err(LifecycleError::ShutdownInProgress),
            None => Ok(Outcome::Cancelled),
        }
    }
}
