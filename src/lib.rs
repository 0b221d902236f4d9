//! # Job System
//!
//! A fixed-size worker thread pool that executes submitted jobs on pre-spawned
//! OS threads and marshals completion callbacks back onto the owner thread.
//!
//! ## Features
//!
//! - **Worker Pool**: Fixed set of workers, all running before construction returns
//! - **Job Queue**: Unbounded FIFO monitor queue; pushes wake one idle worker
//! - **Owner-Thread Callbacks**: Completions drained in FIFO order by `update()`
//! - **Processor Affinity**: Optional best-effort round-robin pinning of workers
//! - **Panic Isolation**: A failing or panicking job never kills its worker
//! - **Instance-Scoped Logging**: Injected leveled logger, substitutable in tests
//!
//! ## Quick Start
//!
//! ```rust
//! use job_system::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Four workers, all Running before this returns
//! let pool = JobSystem::with_workers(4)?;
//!
//! // Submit jobs
//! for i in 0..10 {
//!     pool.add_job(move || {
//!         println!("job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! // Drain completions on this (the owner) thread
//! pool.update();
//!
//! // Shutdown gracefully; jobs still queued are abandoned
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use job_system::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! // worker_count of 0 derives 2 × hardware_concurrency − 1
//! let config = JobSystemConfig::new(0)
//!     .with_affinity_mode(AffinityMode::Pinned)
//!     .with_poll_interval(Duration::from_micros(100))
//!     .with_thread_name_prefix("render-worker")
//!     .with_logger(Logger::console(Severity::Warning));
//!
//! let pool = JobSystem::with_config(config)?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Owner-Thread Completions
//!
//! ```rust
//! use job_system::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let pool = JobSystem::with_workers(2)?;
//! let completions = pool.completions();
//!
//! pool.add_job(move || {
//!     // Runs on a worker thread...
//!     completions.post(|| {
//!         // ...but this runs on the owner thread, inside update()
//!         println!("done, back on the owner thread");
//!     });
//!     Ok(())
//! })?;
//!
//! std::thread::sleep(Duration::from_millis(50));
//! let drained = pool.update();
//! assert!(drained <= 1);
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use job_system::prelude::*;
//!
//! struct ResizeImage {
//!     name: String,
//! }
//!
//! impl Job for ResizeImage {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("resizing {}", self.name);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "ResizeImage"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = JobSystem::with_workers(2)?;
//! pool.submit(ResizeImage {
//!     name: "portrait.png".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod affinity;
pub mod core;
pub mod logging;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use crate::affinity::ProcessorMask;
pub use crate::core::{BoxedJob, ClosureJob, Job, PoolError, Result};
pub use crate::logging::{Logger, Severity};
pub use crate::pool::{AffinityMode, JobSystem, JobSystemConfig, WorkerState, WorkerStats};
pub use crate::queue::CompletionHandle;
