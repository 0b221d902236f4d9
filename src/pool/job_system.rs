//! Job system implementation

use crate::affinity::{self, ProcessorMask};
use crate::core::{ClosureJob, Job, PoolError, Result};
use crate::logging::Logger;
use crate::pool::worker::{Worker, WorkerState, WorkerStats};
use crate::queue::{CompletionHandle, CompletionQueue, JobQueue};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How workers are bound to logical processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffinityMode {
    /// No worker is pinned; the OS schedules freely
    #[default]
    Floating,
    /// Worker `i` is pinned to logical processor `i % hardware_concurrency()`
    Pinned,
}

/// Configuration for a job system
#[derive(Debug, Clone)]
pub struct JobSystemConfig {
    /// Number of worker threads (0 = derive `2 × hardware_concurrency − 1`,
    /// reserving one logical core of headroom for the owner thread)
    pub worker_count: usize,
    /// Processor binding policy for the pool.
    /// Default: Floating
    pub affinity: AffinityMode,
    /// Upper bound on an idle worker's wait for a job before it re-checks its
    /// lifecycle state. Default: 100µs
    ///
    /// Also bounds how long a terminate request can wait for an idle worker
    /// to notice it (a push or terminate wakes waiting workers early).
    pub poll_interval: Duration,
    /// Worker thread name prefix
    pub thread_name_prefix: String,
    /// Logging capability shared by the pool and its workers
    pub logger: Logger,
}

impl Default for JobSystemConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            affinity: AffinityMode::Floating,
            poll_interval: Duration::from_micros(100),
            thread_name_prefix: "worker".to_string(),
            logger: Logger::default(),
        }
    }
}

impl JobSystemConfig {
    /// Create a new configuration with the specified number of workers
    /// (0 derives the default).
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Set the processor binding policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_affinity_mode(mut self, affinity: AffinityMode) -> Self {
        self.affinity = affinity;
        self
    }

    /// Set the worker poll interval.
    ///
    /// Shorter intervals improve shutdown responsiveness at slightly higher
    /// idle wake-up cost; pushes wake an idle worker regardless. Must be
    /// non-zero (enforced by [`validate`](Self::validate)).
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the worker thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the logging capability
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Worker count after applying the zero-derivation rule.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            2 * affinity::hardware_concurrency() - 1
        } else {
            self.worker_count
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(PoolError::invalid_config(
                "poll_interval",
                "poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// A fixed pool of worker threads with owner-thread completion callbacks.
///
/// Construction spawns every worker; jobs submitted afterwards are executed
/// on whichever worker pops them first. Work that must run on the owner
/// thread is posted through a [`CompletionHandle`] and invoked by
/// [`update`](Self::update).
///
/// # Shutdown
///
/// [`shutdown`](Self::shutdown) (also run on drop) asks each worker to
/// terminate and joins it. Jobs still queued at that point are abandoned,
/// never executed; the abandoned count is logged.
pub struct JobSystem {
    config: JobSystemConfig,
    queue: Arc<JobQueue>,
    completions: Arc<CompletionQueue>,
    workers: Mutex<Vec<Worker>>,
    running: AtomicBool,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for JobSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSystem")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("job_count", &self.queue.len())
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl JobSystem {
    /// Create a pool with the default configuration: derived worker count,
    /// floating affinity, console logging.
    pub fn new() -> Result<Self> {
        Self::with_config(JobSystemConfig::default())
    }

    /// Create a pool with `count` workers (0 derives the default).
    pub fn with_workers(count: usize) -> Result<Self> {
        Self::with_config(JobSystemConfig::new(count))
    }

    /// Create a pool from `config`.
    ///
    /// Every worker is created and observably `Running` before this returns.
    /// A worker whose OS thread cannot be spawned is logged at Error and
    /// skipped: the pool starts with fewer workers than requested rather than
    /// failing construction.
    pub fn with_config(config: JobSystemConfig) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(JobQueue::new());
        let requested = config.resolved_worker_count();
        let concurrency = affinity::hardware_concurrency();
        let logger = &config.logger;

        logger.info(format!(
            "job system starting {requested} workers ({:?} affinity, {concurrency} logical processors)",
            config.affinity
        ));

        let mut workers = Vec::with_capacity(requested);
        for id in 0..requested {
            let mask = match config.affinity {
                AffinityMode::Floating => ProcessorMask::ALL,
                AffinityMode::Pinned => ProcessorMask::single(id % concurrency),
            };
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::spawn(
                id,
                name,
                Arc::clone(&queue),
                mask,
                config.poll_interval,
                logger.clone(),
            ) {
                Ok(worker) => {
                    logger.debug(format!(
                        "created worker-{} (affinity {})",
                        worker.id(),
                        worker.affinity()
                    ));
                    workers.push(worker);
                }
                Err(e) => logger.error(format!("starting with one fewer worker: {e}")),
            }
        }

        Ok(Self {
            config,
            queue,
            completions: Arc::new(CompletionQueue::new()),
            workers: Mutex::new(workers),
            running: AtomicBool::new(true),
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Submit a closure as a job with default (all-processor) affinity.
    ///
    /// No backpressure: the call enqueues and returns immediately.
    pub fn add_job<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a job with default (all-processor) affinity.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit_with_affinity(job, ProcessorMask::ALL)
    }

    /// Submit a job tagged with an affinity mask.
    ///
    /// The mask is stored with the queued job and handed to whichever worker
    /// pops it; dispatch does not route on it.
    pub fn submit_with_affinity<J: Job + 'static>(
        &self,
        job: J,
        affinity: ProcessorMask,
    ) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PoolError::not_running(&self.config.thread_name_prefix));
        }
        self.queue.push(Box::new(job), affinity);
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Submit a job plus a completion that runs on the owner thread.
    ///
    /// The completion is posted once the job finishes, whether it succeeded
    /// or not, and is invoked at the owner thread's next [`update`](Self::update).
    pub fn add_job_with_completion<F, C>(&self, f: F, completion: C) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let handle = self.completions();
        self.add_job(move || {
            let result = f();
            handle.post(completion);
            result
        })
    }

    /// Advisory number of jobs waiting in the queue.
    pub fn job_count(&self) -> usize {
        self.queue.len()
    }

    /// Producer handle jobs capture to post work back to the owner thread.
    pub fn completions(&self) -> CompletionHandle {
        CompletionHandle::new(Arc::clone(&self.completions))
    }

    /// Owner-thread entry point: drain and invoke queued completions.
    ///
    /// Pops from the completion queue until it reports empty, invoking each
    /// completion synchronously in FIFO order on the calling thread. Returns
    /// the number of completions invoked; an empty queue returns 0
    /// immediately.
    pub fn update(&self) -> usize {
        let mut drained = 0;
        while let Some(completion) = self.completions.pop() {
            completion();
            drained += 1;
        }
        drained
    }

    /// Number of workers the pool holds.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Number of workers currently in the `Running` state.
    pub fn running_workers(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|w| w.state() == WorkerState::Running)
            .count()
    }

    /// Whether the pool is accepting jobs.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Total number of jobs accepted by [`submit_with_affinity`](Self::submit_with_affinity)
    /// and its wrappers.
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.lock().iter().map(|w| w.stats()).collect()
    }

    /// Total jobs processed across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.workers
            .lock()
            .iter()
            .map(|w| w.stats().get_jobs_processed())
            .sum()
    }

    /// Total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        self.workers
            .lock()
            .iter()
            .map(|w| w.stats().get_jobs_failed())
            .sum()
    }

    /// Total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.workers
            .lock()
            .iter()
            .map(|w| w.stats().get_jobs_panicked())
            .sum()
    }

    /// Stop accepting jobs, terminate every worker and join it.
    ///
    /// Jobs still queued when termination is requested are abandoned (never
    /// executed); the abandoned count is logged. Idempotent: repeated calls,
    /// and drop after an explicit call, are no-ops.
    pub fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let logger = &self.config.logger;
        logger.info("job system shutting down");

        let workers = std::mem::take(&mut *self.workers.lock());
        for mut worker in workers {
            if let Err(e) = worker.request_terminate() {
                logger.error(format!("worker-{} failed to stop cleanly: {e}", worker.id()));
            }
        }

        let abandoned = self.queue.len();
        if abandoned > 0 {
            logger.warning(format!("{abandoned} queued jobs abandoned at shutdown"));
        }
        Ok(())
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            self.config
                .logger
                .error(format!("shutdown during drop failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{MemorySink, Severity};
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn quiet_config(worker_count: usize) -> JobSystemConfig {
        JobSystemConfig::new(worker_count).with_logger(Logger::disabled())
    }

    #[test]
    fn test_config_defaults() {
        let config = JobSystemConfig::default();
        assert_eq!(config.worker_count, 0);
        assert_eq!(config.affinity, AffinityMode::Floating);
        assert_eq!(config.poll_interval, Duration::from_micros(100));
        assert_eq!(config.thread_name_prefix, "worker");
    }

    #[test]
    fn test_config_derives_worker_count_from_concurrency() {
        let config = JobSystemConfig::default();
        assert_eq!(
            config.resolved_worker_count(),
            2 * affinity::hardware_concurrency() - 1
        );
        assert_eq!(JobSystemConfig::new(6).resolved_worker_count(), 6);
    }

    #[test]
    fn test_config_rejects_zero_poll_interval() {
        let config = JobSystemConfig::new(2).with_poll_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_pool_spawns_requested_workers() {
        let pool = JobSystem::with_config(quiet_config(3)).expect("create pool");
        assert_eq!(pool.worker_count(), 3);
        assert_eq!(pool.running_workers(), 3);
        pool.shutdown().expect("shutdown");
        assert_eq!(pool.worker_count(), 0);
    }

    #[test]
    fn test_jobs_execute_exactly_once() {
        let pool = JobSystem::with_config(quiet_config(2)).expect("create pool");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            pool.add_job(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("submit");
        }
        assert_eq!(pool.total_jobs_submitted(), 5);

        while pool.job_count() > 0 {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(pool.total_jobs_processed(), 5);

        pool.shutdown().expect("shutdown");
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let pool = JobSystem::with_config(quiet_config(1)).expect("create pool");
        pool.shutdown().expect("shutdown");

        let result = pool.add_job(|| Ok(()));
        assert!(matches!(result, Err(PoolError::NotRunning { .. })));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let pool = JobSystem::with_config(quiet_config(2)).expect("create pool");
        pool.shutdown().expect("first shutdown");
        pool.shutdown().expect("second shutdown");
        // Drop performs a third, also a no-op.
    }

    #[test]
    fn test_update_on_empty_queue_invokes_nothing() {
        let pool = JobSystem::with_config(quiet_config(1)).expect("create pool");
        assert_eq!(pool.update(), 0);
        pool.shutdown().expect("shutdown");
    }

    #[test]
    fn test_completions_run_on_calling_thread() {
        let pool = JobSystem::with_config(quiet_config(2)).expect("create pool");
        let handle = pool.completions();

        let owner = thread::current().id();
        let observed = Arc::new(Mutex::new(None));
        {
            let observed = Arc::clone(&observed);
            pool.add_job(move || {
                handle.post(move || {
                    *observed.lock() = Some(thread::current().id());
                });
                Ok(())
            })
            .expect("submit");
        }

        while pool.completions().pending() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(pool.update(), 1);
        assert_eq!(*observed.lock(), Some(owner));

        pool.shutdown().expect("shutdown");
    }

    #[test]
    fn test_abandoned_jobs_are_counted_and_logged() {
        let sink = Arc::new(MemorySink::new());
        let config = JobSystemConfig::new(1)
            .with_logger(Logger::sink(Severity::Verbose, sink.clone()));
        let pool = JobSystem::with_config(config).expect("create pool");

        let gate = Arc::new(AtomicUsize::new(0));
        {
            let gate = Arc::clone(&gate);
            pool.add_job(move || {
                gate.store(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(100));
                Ok(())
            })
            .expect("submit blocker");
        }
        while gate.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let never_ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let never_ran = Arc::clone(&never_ran);
            pool.add_job(move || {
                never_ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("submit abandoned");
        }

        pool.shutdown().expect("shutdown");

        assert_eq!(never_ran.load(Ordering::SeqCst), 0);
        assert_eq!(pool.job_count(), 3);
        assert!(sink.contains("3 queued jobs abandoned at shutdown"));
    }
}
