//! Move-only ownership of an OS thread.

use std::thread::{JoinHandle, ThreadId};

/// A programmer error: a [`ThreadHandle`] was joined from the thread it identifies.
const JOIN_SELF_MESSAGE: &str = "ThreadHandle::join called from the thread it owns";

/// Move-only owner of an OS thread, returned by [`spawn`](crate::thread::spawn).
///
/// A `ThreadHandle<T>` must be consumed exactly once via [`join`](Self::join). It
/// cannot be cloned or copied, so double-join is unrepresentable at the type level.
/// Dropping a handle without joining is a programmer error: the underlying thread is
/// detached (matching [`std::thread::JoinHandle`]'s own drop behavior) and cannot be
/// observed again.
#[derive(Debug)]
pub struct ThreadHandle<T> {
    id: ThreadId,
    inner: JoinHandle<T>,
}

impl<T> ThreadHandle<T> {
    pub(crate) fn new(inner: JoinHandle<T>) -> Self {
        let id = inner.thread().id();
        Self { id, inner }
    }

    /// The [`ThreadId`] of the owned thread.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns `true` iff the calling thread is the one this handle refers to.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.id == std::thread::current().id()
    }

    /// Consumes the handle and blocks until the thread exits, returning the value its
    /// body produced.
    ///
    /// # Panics
    ///
    /// Panics if called from the thread this handle identifies — joining yourself
    /// would deadlock forever, so this is treated as a fatal precondition violation
    /// rather than a hang. Also panics (propagating the original payload) if the
    /// owned thread itself panicked.
    pub fn join(self) -> T {
        assert!(!self.is_current(), "{JOIN_SELF_MESSAGE}");
        match self.inner.join() {
            Ok(value) => value,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}
