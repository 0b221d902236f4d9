//! Mutex-guarded FIFO of pending jobs.

use crate::affinity::ProcessorMask;
use crate::core::BoxedJob;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// A pending job together with its processor-affinity tag.
///
/// The mask is advisory: it is stored with the job and handed to whichever
/// worker pops it, but dispatch does not route on it.
pub struct QueuedJob {
    /// The unit of work
    pub job: BoxedJob,
    /// Processors the job is nominally eligible for
    pub affinity: ProcessorMask,
}

impl fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("job", &self.job)
            .field("affinity", &self.affinity)
            .finish()
    }
}

/// Thread-safe FIFO of pending jobs shared by the pool and its workers.
///
/// Every mutation happens under one mutex; push wakes one waiting consumer.
/// The queue is unbounded: producers outpacing consumers grow it without
/// limit (a documented limitation, not a failure).
///
/// Each pushed job is delivered to exactly one popper, and the relative FIFO
/// order of any two pushes is preserved in the order of their pops.
pub struct JobQueue {
    jobs: Mutex<VecDeque<QueuedJob>>,
    available: Condvar,
}

impl JobQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append a job tagged with `affinity` and wake one waiting consumer.
    pub fn push(&self, job: BoxedJob, affinity: ProcessorMask) {
        self.jobs.lock().push_back(QueuedJob { job, affinity });
        self.available.notify_one();
    }

    /// Remove and return the head, or `None` if the queue is empty.
    ///
    /// Never blocks beyond the critical section and never fails.
    pub fn pop(&self) -> Option<QueuedJob> {
        self.jobs.lock().pop_front()
    }

    /// Like [`pop`](Self::pop), but waits up to `timeout` for a push when the
    /// queue is empty.
    ///
    /// Worker loops call this with their poll interval so an idle worker
    /// sleeps until woken by a push (or the timeout) instead of spinning.
    /// A `None` return after the wait is normal: the job may have been taken
    /// by another consumer, or the wait may have been cut short by
    /// [`wake_all`](Self::wake_all).
    pub fn pop_timeout(&self, timeout: Duration) -> Option<QueuedJob> {
        let mut jobs = self.jobs.lock();
        if jobs.is_empty() {
            let _ = self.available.wait_for(&mut jobs, timeout);
        }
        jobs.pop_front()
    }

    /// Advisory snapshot of the current depth.
    ///
    /// Race-prone by nature: the depth can change between this read and any
    /// decision taken on it.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether the queue is currently empty (same advisory caveat as `len`).
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Wake every consumer waiting in [`pop_timeout`](Self::pop_timeout) so it
    /// can re-examine its state. Used when termination is requested.
    pub fn wake_all(&self) {
        self.available.notify_all();
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn named_job(name: &str) -> BoxedJob {
        Box::new(ClosureJob::with_name(|| Ok(()), name))
    }

    #[test]
    fn test_push_pop_fifo_order() {
        let queue = JobQueue::new();
        for i in 0..10 {
            queue.push(named_job(&format!("job-{i}")), ProcessorMask::ALL);
        }
        for i in 0..10 {
            let popped = queue.pop().expect("queue should not be empty");
            assert_eq!(popped.job.job_type(), format!("job-{i}"));
        }
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let queue = JobQueue::new();
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_len_tracks_pushes_and_pops() {
        let queue = JobQueue::new();
        for i in 0..5 {
            queue.push(named_job(&format!("job-{i}")), ProcessorMask::ALL);
        }
        assert_eq!(queue.len(), 5);

        queue.pop();
        queue.pop();
        assert_eq!(queue.len(), 3);
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_affinity_tag_travels_with_job() {
        let queue = JobQueue::new();
        queue.push(named_job("pinned"), ProcessorMask::single(2));
        queue.push(named_job("floating"), ProcessorMask::ALL);

        let first = queue.pop().expect("first job");
        assert_eq!(first.affinity, ProcessorMask::single(2));
        let second = queue.pop().expect("second job");
        assert!(second.affinity.is_unrestricted());
    }

    #[test]
    fn test_pop_timeout_expires_on_empty_queue() {
        let queue = JobQueue::new();
        let start = Instant::now();
        assert!(queue.pop_timeout(Duration::from_millis(20)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_pop_timeout_wakes_on_push() {
        let queue = Arc::new(JobQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(named_job("late"), ProcessorMask::ALL);
            })
        };

        // Well under the 1s bound if the push actually wakes the waiter.
        let popped = queue.pop_timeout(Duration::from_secs(1));
        producer.join().expect("producer thread");
        assert_eq!(popped.expect("job").job.job_type(), "late");
    }

    #[test]
    fn test_wake_all_interrupts_waiters() {
        let queue = Arc::new(JobQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_timeout(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.wake_all();
        assert!(waiter.join().expect("waiter thread").is_none());
    }

    #[test]
    fn test_concurrent_producers_lose_no_jobs() {
        let queue = Arc::new(JobQueue::new());
        let per_producer = 25;

        let mut handles = Vec::new();
        for p in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..per_producer {
                    queue.push(named_job(&format!("p{p}-{i}")), ProcessorMask::ALL);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("producer thread");
        }

        let mut received = 0;
        while queue.pop().is_some() {
            received += 1;
        }
        assert_eq!(received, 4 * per_producer);
    }
}
