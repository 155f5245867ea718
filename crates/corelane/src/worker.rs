//! A managed OS thread that runs until told to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::thread::{spawn_named, ThreadHandle, ThreadSpawnError};

/// A cooperative stop flag shared between a [`Worker`]'s owner and its thread body.
///
/// Setting the token does not interrupt a blocked body; the body must poll
/// [`should_stop`](Self::should_stop) at points where it can safely unwind (e.g.
/// each iteration of its own wait loop).
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Creates a fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the owning body stop.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// An OS thread paired with the [`StopToken`] that asks it to exit.
///
/// `Worker` is the building block the blocking lane (and anything else running a
/// long-lived loop on a dedicated thread) spawns its threads through: the caller
/// gets a uniform stop-then-join shutdown sequence instead of reinventing one per
/// call site.
pub struct Worker {
    stop: StopToken,
    handle: Option<ThreadHandle<()>>,
}

impl Worker {
    /// Spawns `body` on a new named thread, passing it a [`StopToken`] it should
    /// poll to know when to exit.
    pub fn start<F>(name: impl Into<String>, body: F) -> Result<Self, ThreadSpawnError>
    where
        F: FnOnce(&StopToken) + Send + 'static,
    {
        let stop = StopToken::new();
        let stop_in_thread = stop.clone();
        let handle = spawn_named(name, move || body(&stop_in_thread))?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// The stop token for this worker. Cloning it lets multiple owners request
    /// a stop without each holding the `Worker` itself.
    #[must_use]
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Requests the worker stop, without waiting for it to exit.
    pub fn request_stop(&self) {
        self.stop.stop();
    }

    /// Requests the worker stop and blocks until its thread exits.
    pub fn join(mut self) {
        self.stop.stop();
        if let Some(handle) = self.handle.take() {
            handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // A dropped-without-join Worker still asks its thread to stop; it just
        // can't wait for it, matching ThreadHandle's own detach-on-drop behavior.
        self.stop.stop();
    }
}
