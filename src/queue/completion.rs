//! Completion queue drained on the owner thread.

use crossbeam_queue::SegQueue;
use std::fmt;
use std::sync::Arc;

/// A deferred completion destined for the owner thread.
pub type Completion = Box<dyn FnOnce() + Send>;

/// FIFO of completions awaiting the owner thread's next drain.
///
/// Workers (or any thread holding a [`CompletionHandle`]) push; only the
/// owner thread pops, via `JobSystem::update`.
#[derive(Default)]
pub(crate) struct CompletionQueue {
    inner: SegQueue<Completion>,
}

impl CompletionQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, completion: Completion) {
        self.inner.push(completion);
    }

    pub(crate) fn pop(&self) -> Option<Completion> {
        self.inner.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("len", &self.len())
            .finish()
    }
}

/// Cloneable producer handle for the pool's completion queue.
///
/// A job that must report back to the owner thread captures a handle and
/// [`post`](Self::post)s the work; `JobSystem::update` later invokes posted
/// completions in FIFO order on the owner thread.
#[derive(Clone)]
pub struct CompletionHandle {
    queue: Arc<CompletionQueue>,
}

impl CompletionHandle {
    pub(crate) fn new(queue: Arc<CompletionQueue>) -> Self {
        Self { queue }
    }

    /// Schedule `f` to run on the owner thread at its next drain.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(f));
    }

    /// Advisory count of completions not yet drained.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("pending", &self.pending())
            .finish()
    }
}
