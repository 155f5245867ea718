//! The lifecycle-vs-domain error split shared by this crate's blocking components.

use thiserror::Error;

/// Wraps a component's domain error `E` together with the handful of failure
/// modes that are about the component's *lifecycle* rather than the work it was
/// asked to do: shutdown in progress, cancellation, or an externally-attributed
/// timeout.
///
/// Keeping these disjoint from `E` at the type level means a caller matching on
/// `E` never has to account for "the thing I depend on went away" alongside its
/// own domain failures — that case is a different variant of a different type.
/// [`Lane`](crate::lane::Lane) itself never constructs [`Cancelled`](Self::Cancelled)
/// or [`Timeout`](Self::Timeout) — it folds both into `Outcome::Cancelled` and
/// `LaneError::DeadlineExceeded` respectively, since those are properties of one
/// submission rather than of the lane's lifecycle. The two variants exist here
/// for components layered above a lane that want to attribute a timeout or
/// cancellation to themselves rather than to the lane they're built on.
#[derive(Debug, Error)]
pub enum LifecycleError<E: std::error::Error> {
    /// The component has begun or finished shutting down and will not accept or
    /// complete any further work.
    #[error("component is shutting down or has shut down")]
    ShutdownInProgress,
    /// The caller's own cancellation signal fired, attributed at this layer
    /// rather than folded into a domain-level outcome.
    #[error("operation was cancelled")]
    Cancelled,
    /// An externally-imposed deadline elapsed, distinct from any deadline the
    /// domain error `E` itself might report.
    #[error("operation timed out")]
    Timeout,
    /// The work failed for a reason specific to what it was trying to do.
    #[error(transparent)]
    Failure(#[from] E),
}

impl<E: std::error::Error> LifecycleError<E> {
    /// `true` iff this is [`LifecycleError::ShutdownInProgress`].
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::ShutdownInProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn is_shutdown_distinguishes_variants() {
        let shutdown: LifecycleError<Boom> = LifecycleError::ShutdownInProgress;
        let failure: LifecycleError<Boom> = LifecycleError::from(Boom);
        assert!(shutdown.is_shutdown());
        assert!(!failure.is_shutdown());
        assert!(!LifecycleError::<Boom>::Cancelled.is_shutdown());
        assert!(!LifecycleError::<Boom>::Timeout.is_shutdown());
    }
}
