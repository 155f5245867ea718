//! Move-only thread handles and spawn helpers.

mod handle;
mod spawn;

pub use handle::ThreadHandle;
pub use spawn::{spawn, spawn_named, spawn_or_abort, spawn_with, ThreadSpawnError};
