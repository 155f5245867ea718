//! Serial executors, a deadline-aware blocking lane, and the move-only
//! primitives (thread handles, one-shot handoffs, self-owning retains) they're
//! built from.
//!
//! Three layers, from the bottom up:
//!
//! - [`thread`], [`handoff`], [`retained`], [`worker`]: move-only ownership of
//!   OS threads, one-shot cross-thread value transfer, self-owning references
//!   for escaping into callback APIs, and a managed stop-token'd thread.
//! - [`executor`]: [`SerialExecutor`](executor::SerialExecutor), a dedicated
//!   thread that runs submitted closures strictly in FIFO order, and
//!   [`ExecutorPool`](executor::ExecutorPool), a sharded round-robin pool of
//!   them.
//! - [`lane`]: [`Lane`](lane::Lane), the deadline-aware, backpressure-bounded
//!   bridge between async callers and a pool of dedicated worker threads.
//!
//! [`lifecycle`] and [`stats`] are shared across the above: the
//! [`LifecycleError`](lifecycle::LifecycleError) split between "this component
//! is gone" and "this particular call failed", and the lock-free counters
//! each component exposes.

pub mod aligned;
pub mod executor;
pub mod handoff;
pub mod lane;
pub mod lifecycle;
pub mod retained;
pub mod stats;
pub mod thread;
pub mod worker;

pub use lifecycle::LifecycleError;
