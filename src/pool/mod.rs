//! Worker pool and its orchestration

mod job_system;
mod worker;

pub use job_system::{AffinityMode, JobSystem, JobSystemConfig};
pub use worker::{WorkerState, WorkerStats};
