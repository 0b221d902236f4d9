//! Convenient re-exports for common types and traits

pub use crate::affinity::ProcessorMask;
pub use crate::core::{BoxedJob, ClosureJob, Job, PoolError, Result};
pub use crate::logging::{Logger, Severity};
pub use crate::pool::{AffinityMode, JobSystem, JobSystemConfig, WorkerState, WorkerStats};
pub use crate::queue::CompletionHandle;
