//! Worker thread implementation

use crate::affinity::{self, ProcessorMask};
use crate::core::{BoxedJob, PoolError, Result};
use crate::logging::Logger;
use crate::queue::JobQueue;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Lifecycle state of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Not running; the initial and terminal state
    Idle = 0,
    /// The poll/execute loop is live
    Running = 1,
    /// The loop observed a terminate request and is winding down
    Terminating = 2,
    /// Termination requested but not yet observed by the loop
    Terminate = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::Terminating,
            _ => WorkerState::Terminate,
        }
    }

    /// State name used in transition logs.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Idle => "Idle",
            WorkerState::Running => "Running",
            WorkerState::Terminating => "Terminating",
            WorkerState::Terminate => "Terminate",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder for a [`WorkerState`] shared between the pool and the loop.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: WorkerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn swap(&self, state: WorkerState) -> WorkerState {
        WorkerState::from_u8(self.0.swap(state as u8, Ordering::AcqRel))
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Per-worker job counters.
#[derive(Debug, Default)]
pub struct WorkerStats {
    jobs_processed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_panicked: AtomicU64,
}

impl WorkerStats {
    fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Jobs executed to successful completion
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Jobs whose `execute` returned an error
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Jobs that panicked during execution
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }
}

/// A worker thread servicing the shared job queue.
///
/// The state machine runs Idle → Running on spawn; a terminate request moves
/// Running → Terminate, and the loop answers with Terminating → Idle before
/// its OS thread exits. The affinity mask is applied best-effort on the
/// worker's own thread at start and never changes afterwards.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    state: Arc<StateCell>,
    stats: Arc<WorkerStats>,
    affinity: ProcessorMask,
    queue: Arc<JobQueue>,
    logger: Logger,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create the worker and start its OS thread.
    ///
    /// The worker is observably `Running` once this returns. A spawn failure
    /// leaves it `Idle` and surfaces as [`PoolError::Spawn`]; the caller
    /// decides whether to degrade or abort.
    pub(crate) fn spawn(
        id: usize,
        name: String,
        queue: Arc<JobQueue>,
        affinity: ProcessorMask,
        poll_interval: Duration,
        logger: Logger,
    ) -> Result<Self> {
        let state = Arc::new(StateCell::new(WorkerState::Idle));
        let stats = Arc::new(WorkerStats::default());

        set_state(&logger, id, &state, WorkerState::Running);

        let loop_state = Arc::clone(&state);
        let loop_stats = Arc::clone(&stats);
        let loop_queue = Arc::clone(&queue);
        let loop_logger = logger.clone();
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                Self::run(
                    id,
                    loop_queue,
                    loop_state,
                    loop_stats,
                    affinity,
                    poll_interval,
                    loop_logger,
                );
            })
            .map_err(|e| {
                state.swap(WorkerState::Idle);
                PoolError::spawn_with_source(id, "cannot create worker thread", e)
            })?;

        Ok(Self {
            id,
            state,
            stats,
            affinity,
            queue,
            logger,
            thread: Some(thread),
        })
    }

    /// Worker ID
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state
    pub(crate) fn state(&self) -> WorkerState {
        self.state.load()
    }

    /// Worker statistics
    pub(crate) fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Affinity mask assigned at construction
    pub(crate) fn affinity(&self) -> ProcessorMask {
        self.affinity
    }

    /// Ask the loop to exit and join the OS thread.
    ///
    /// Only acts when the worker is currently `Running`; in any other state
    /// this is a no-op, so repeated calls are safe. Blocks until the loop
    /// observes the request and exits, bounded by the poll interval plus any
    /// in-flight job.
    pub(crate) fn request_terminate(&mut self) -> Result<()> {
        if !self
            .state
            .transition(WorkerState::Running, WorkerState::Terminate)
        {
            return Ok(());
        }
        self.logger.verbose(format!(
            "worker-{} state {} -> {}",
            self.id,
            WorkerState::Running,
            WorkerState::Terminate
        ));

        // A worker idling in pop_timeout re-checks its state once woken.
        self.queue.wake_all();

        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "worker thread panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop, run on the worker's own OS thread.
    fn run(
        id: usize,
        queue: Arc<JobQueue>,
        state: Arc<StateCell>,
        stats: Arc<WorkerStats>,
        affinity: ProcessorMask,
        poll_interval: Duration,
        logger: Logger,
    ) {
        match affinity::pin_current_thread(affinity) {
            Ok(Some(processor)) => {
                logger.debug(format!("worker-{id} pinned to processor {processor}"));
            }
            Ok(None) => {}
            Err(e) => {
                logger.warning(format!(
                    "worker-{id} affinity {affinity} not applied ({e}); running unrestricted"
                ));
            }
        }

        while state.load() == WorkerState::Running {
            if let Some(queued) = queue.pop_timeout(poll_interval) {
                Self::execute_job(id, queued.job, &stats, &logger);
            }
            // A None pop means the wait timed out or was interrupted;
            // the loop condition re-examines the state either way.
        }

        set_state(&logger, id, &state, WorkerState::Terminating);
        logger.info(format!(
            "worker-{id} exiting: {} processed, {} failed, {} panicked, {} jobs left in queue",
            stats.get_jobs_processed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked(),
            queue.len()
        ));
        set_state(&logger, id, &state, WorkerState::Idle);
    }

    /// Execute a single job with panic isolation.
    ///
    /// A failing or panicking job is logged and counted; the loop survives.
    fn execute_job(id: usize, mut job: BoxedJob, stats: &WorkerStats, logger: &Logger) {
        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));
        match outcome {
            Ok(Ok(())) => stats.increment_processed(),
            Ok(Err(e)) => {
                logger.error(format!("worker-{id}: job '{}' failed: {e}", job.job_type()));
                stats.increment_failed();
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                logger.error(format!(
                    "worker-{id}: job '{}' panicked: {panic_msg}",
                    job.job_type()
                ));
                stats.increment_panicked();
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Err(e) = self.request_terminate() {
            self.logger.error(format!("worker-{} drop: {e}", self.id));
        }
    }
}

fn set_state(logger: &Logger, id: usize, cell: &StateCell, to: WorkerState) {
    let from = cell.swap(to);
    logger.verbose(format!("worker-{id} state {from} -> {to}"));
}
