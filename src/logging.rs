//! Leveled logging capability, instance-scoped.
//!
//! A [`Logger`] is injected into the pool at construction and shared (cheaply,
//! via `Arc`) with every worker. It filters by [`Severity`] threshold and fans
//! out to one or more [`LogSink`]s: [`ConsoleSink`] splits records across
//! stdout/stderr, [`FileSink`] appends to a truncate-on-open text file, and
//! [`MemorySink`] captures records for tests.
//!
//! Severity ordering, least to most severe:
//! `Verbose < Debug < Information < Warning < Error < Fatal`.
//! A record is emitted only when its severity is at least the logger's
//! threshold.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write as _};
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

/// Message severity, declared least to most severe so `Ord` follows importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Chatty tracing, e.g. worker state transitions
    Verbose,
    /// Diagnostic detail
    Debug,
    /// Normal operational messages
    Information,
    /// Recoverable degradation, e.g. a failed affinity assignment
    Warning,
    /// An operation failed
    Error,
    /// The process cannot continue
    Fatal,
}

impl Severity {
    /// Uppercase tag used in rendered records.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Information => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log message with its source location and timestamp.
#[derive(Debug)]
pub struct LogRecord<'a> {
    /// Severity of the message
    pub severity: Severity,
    /// Source file that produced the message
    pub file: &'a str,
    /// Line within `file`
    pub line: u32,
    /// When the record was produced
    pub timestamp: DateTime<Local>,
    /// The message itself
    pub message: &'a str,
}

impl LogRecord<'_> {
    /// Canonical single-line rendering: `<ts> <file>(<line>) [<LEVEL>] <message>`.
    pub fn render(&self) -> String {
        format!(
            "{} {}({}) [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.file,
            self.line,
            self.severity,
            self.message
        )
    }
}

/// Destination for log records that passed the threshold filter.
pub trait LogSink: Send + Sync {
    /// Consume one record.
    fn write(&self, record: &LogRecord<'_>);
}

/// Console sink: Error and Fatal go to stderr, everything else to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, record: &LogRecord<'_>) {
        let line = record.render();
        if record.severity >= Severity::Error {
            let _ = writeln!(io::stderr().lock(), "{line}");
        } else {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
    }
}

/// Text-file sink; the file is truncated when the sink is created.
pub struct FileSink {
    file: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Create (truncating) the log file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord<'_>) {
        let mut file = self.file.lock();
        let _ = writeln!(file, "{}", record.render());
        let _ = file.flush();
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink").finish_non_exhaustive()
    }
}

/// Capturing sink for tests: keeps `(severity, message)` pairs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    /// Create an empty capturing sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<(Severity, String)> {
        self.records.lock().clone()
    }

    /// Whether any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord<'_>) {
        self.records
            .lock()
            .push((record.severity, record.message.to_string()));
    }
}

struct LoggerInner {
    threshold: Severity,
    sinks: Vec<Arc<dyn LogSink>>,
}

/// Instance-scoped leveled logger shared by a pool and its workers.
///
/// Cloning is cheap (the sink set is behind an `Arc`), so each worker carries
/// its own handle to the same sinks.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Logger writing to `sinks`, filtering below `threshold`.
    pub fn new(threshold: Severity, sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self {
            inner: Arc::new(LoggerInner { threshold, sinks }),
        }
    }

    /// Single-sink logger; handy when tests keep their own `Arc` to the sink.
    pub fn sink(threshold: Severity, sink: Arc<dyn LogSink>) -> Self {
        Self::new(threshold, vec![sink])
    }

    /// Console-only logger.
    pub fn console(threshold: Severity) -> Self {
        Self::new(threshold, vec![Arc::new(ConsoleSink)])
    }

    /// Console logger that also appends to a truncate-on-open file at `path`.
    pub fn with_file<P: AsRef<Path>>(threshold: Severity, path: P) -> io::Result<Self> {
        let file = FileSink::create(path)?;
        Ok(Self::new(
            threshold,
            vec![Arc::new(ConsoleSink), Arc::new(file)],
        ))
    }

    /// Logger that emits nothing.
    pub fn disabled() -> Self {
        Self::new(Severity::Fatal, Vec::new())
    }

    /// Configured threshold.
    pub fn threshold(&self) -> Severity {
        self.inner.threshold
    }

    /// Whether a record at `severity` would be emitted.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.inner.threshold && !self.inner.sinks.is_empty()
    }

    /// Emit `message` at `severity` if it passes the threshold.
    pub fn write(&self, severity: Severity, location: &Location<'_>, message: &str) {
        if !self.enabled(severity) {
            return;
        }
        let record = LogRecord {
            severity,
            file: location.file(),
            line: location.line(),
            timestamp: Local::now(),
            message,
        };
        for sink in &self.inner.sinks {
            sink.write(&record);
        }
    }

    /// Emit at Verbose severity.
    #[track_caller]
    pub fn verbose(&self, message: impl AsRef<str>) {
        self.write(Severity::Verbose, Location::caller(), message.as_ref());
    }

    /// Emit at Debug severity.
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.write(Severity::Debug, Location::caller(), message.as_ref());
    }

    /// Emit at Information severity.
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Severity::Information, Location::caller(), message.as_ref());
    }

    /// Emit at Warning severity.
    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.write(Severity::Warning, Location::caller(), message.as_ref());
    }

    /// Emit at Error severity.
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Severity::Error, Location::caller(), message.as_ref());
    }

    /// Emit at Fatal severity.
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.write(Severity::Fatal, Location::caller(), message.as_ref());
    }
}

impl Default for Logger {
    /// Console logger at Information threshold.
    fn default() -> Self {
        Self::console(Severity::Information)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.inner.threshold)
            .field("sinks", &self.inner.sinks.len())
            .finish()
    }
}
