//! Queues shared between the owner thread and the workers.
//!
//! Two FIFO queues carry all cross-thread traffic in the pool:
//!
//! - [`JobQueue`]: pending jobs flowing from producers to workers. A monitor
//!   (mutex + condition variable) that wakes one waiting consumer per push.
//! - The completion queue (reached through [`CompletionHandle`]): completions
//!   flowing from workers back to the owner thread, drained by
//!   `JobSystem::update`.
//!
//! No code path holds both queues' locks at once.

mod completion;
mod job_queue;

pub use completion::{Completion, CompletionHandle};
pub(crate) use completion::CompletionQueue;
pub use job_queue::{JobQueue, QueuedJob};
