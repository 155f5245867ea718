//! Serial, dedicated-thread job execution and sharded pools of it.

pub(crate) mod serial;
mod pool;

pub use pool::{ExecutorPool, PoolConfig};
pub use serial::{ExecutorConfig, SerialExecutor, SubmitError};
