//! Integration tests for the injected logging capability

use job_system::logging::MemorySink;
use job_system::prelude::*;
use std::sync::Arc;

fn pool_with_sink(workers: usize, threshold: Severity) -> (JobSystem, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let config =
        JobSystemConfig::new(workers).with_logger(Logger::sink(threshold, sink.clone()));
    let pool = JobSystem::with_config(config).expect("failed to create pool");
    (pool, sink)
}

#[test]
fn test_verbose_logger_records_worker_lifecycle() {
    let (pool, sink) = pool_with_sink(2, Severity::Verbose);
    pool.shutdown().expect("shutdown");

    let records = sink.records();
    // One Idle -> Running transition per worker at startup.
    let started = records
        .iter()
        .filter(|(severity, message)| {
            *severity == Severity::Verbose && message.contains("state Idle -> Running")
        })
        .count();
    assert_eq!(started, 2);

    assert!(sink.contains("job system starting 2 workers"));
    assert!(sink.contains("job system shutting down"));
    assert!(sink.contains("worker-0 exiting"));
    assert!(sink.contains("worker-1 exiting"));
}

#[test]
fn test_threshold_suppresses_state_transition_chatter() {
    let (pool, sink) = pool_with_sink(1, Severity::Warning);
    pool.shutdown().expect("shutdown");

    let records = sink.records();
    assert!(records
        .iter()
        .all(|(severity, _)| *severity >= Severity::Warning));
    assert!(!sink.contains("state Idle -> Running"));
}

#[test]
fn test_clean_shutdown_logs_no_abandonment_warning() {
    let (pool, sink) = pool_with_sink(2, Severity::Verbose);
    pool.add_job(|| Ok(())).expect("submit");

    while pool.job_count() > 0 {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    std::thread::sleep(std::time::Duration::from_millis(50));
    pool.shutdown().expect("shutdown");

    assert!(!sink.contains("abandoned at shutdown"));
    assert!(sink.contains("0 jobs left in queue"));
}
