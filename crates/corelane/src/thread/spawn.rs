//! Thread spawning built on the [`Handoff`](crate::handoff) cell.

use std::io;

use thiserror::Error;

use crate::handoff::HandoffCell;
use crate::thread::ThreadHandle;

/// Failure to start a new OS thread.
#[derive(Debug, Error)]
pub enum ThreadSpawnError {
    /// The OS refused to create the thread (`std::thread::Builder::spawn` failed).
    #[error("failed to spawn OS thread: {message}")]
    Os {
        /// The OS-reported error code (`io::Error::raw_os_error`), if the
        /// platform attached one, for callers distinguishing e.g.
        /// resource-exhaustion from policy-denial.
        os_code: Option<i32>,
        /// The underlying `io::Error`'s display text.
        message: String,
    },
}

impl From<io::Error> for ThreadSpawnError {
    fn from(err: io::Error) -> Self {
        Self::Os {
            os_code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

/// Spawns `body` on a new OS thread and returns a handle to it.
///
/// This is a thin wrapper over [`std::thread::Builder::spawn`] that returns the
/// move-only [`ThreadHandle`] instead of the standard library's cloneable-free but
/// unconstrained `JoinHandle`.
pub fn spawn<F, T>(body: F) -> Result<ThreadHandle<T>, ThreadSpawnError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inner = std::thread::Builder::new().spawn(body)?;
    Ok(ThreadHandle::new(inner))
}

/// Spawns a named OS thread running `body`.
pub fn spawn_named<F, T>(name: impl Into<String>, body: F) -> Result<ThreadHandle<T>, ThreadSpawnError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inner = std::thread::Builder::new().name(name.into()).spawn(body)?;
    Ok(ThreadHandle::new(inner))
}

/// Moves `value` into a new thread via a [`HandoffCell`] and runs `body` with it.
///
/// This exists alongside plain closure capture to give the handoff a name at the
/// call site: `value` crosses the thread boundary through the same single-use,
/// single-consumer cell used elsewhere in this crate for one-shot ownership
/// transfer, rather than an ad hoc `move` closure.
pub fn spawn_with<T, F, R>(value: T, body: F) -> Result<ThreadHandle<R>, ThreadSpawnError>
where
    T: Send + 'static,
    F: FnOnce(T) -> R + Send + 'static,
    R: Send + 'static,
{
    let (cell, token) = HandoffCell::new(value);
    spawn(move || {
        let value = token.take();
        let _ = &cell; // cell is held only to keep the slot alive until taken
        body(value)
    })
}

/// Like [`spawn`], but aborts the process instead of returning an error.
///
/// Used for internal worker-thread bootstrapping where failing to start a thread
/// indicates the process is already out of resources and cannot make progress
/// regardless of how the error is reported.
pub fn spawn_or_abort<F, T>(name: impl Into<String>, body: F) -> ThreadHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match spawn_named(name, body) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "failed to spawn OS thread, aborting");
            std::process::abort();
        }
    }
}
