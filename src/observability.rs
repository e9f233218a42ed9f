//! Operator-facing output and upload counters
//!
//! Components never log through a process-wide handle of their own; they
//! receive an [`UploadObserver`] when they are built. The default
//! [`TracingObserver`] forwards everything to `tracing` and the process
//! stdout, tests swap in a recorder.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;

/// Sink for everything the operator should see during an upload
pub trait UploadObserver: Send + Sync {
    /// A leveled notice (warnings about missing checkers, dry runs, etc.)
    fn notice(&self, level: Level, message: &str);

    /// Raw standard output captured from a hook command
    fn hook_output(&self, command: &str, output: &str);
}

/// Observer backed by `tracing` for notices and stdout for hook output
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl UploadObserver for TracingObserver {
    fn notice(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{message}"),
            Level::WARN => tracing::warn!("{message}"),
            Level::INFO => tracing::info!("{message}"),
            Level::DEBUG => tracing::debug!("{message}"),
            _ => tracing::trace!("{message}"),
        }
    }

    fn hook_output(&self, command: &str, output: &str) {
        tracing::debug!(command, bytes = output.len(), "Forwarding hook output");
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
            tracing::warn!(command, error = %e, "Failed to forward hook output");
        }
    }
}

/// Counters for a single upload invocation
#[derive(Debug, Default)]
pub struct Metrics {
    files_sent: AtomicU64,
    files_simulated: AtomicU64,
    files_write_denied: AtomicU64,
    hooks_run: AtomicU64,
    checkers_run: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_sent(&self) {
        self.files_sent.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "files_sent", "Metric incremented");
    }

    pub fn file_simulated(&self) {
        self.files_simulated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "files_simulated", "Metric incremented");
    }

    pub fn file_write_denied(&self) {
        self.files_write_denied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "files_write_denied", "Metric incremented");
    }

    pub fn hook_run(&self) {
        self.hooks_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "hooks_run", "Metric incremented");
    }

    pub fn checker_run(&self) {
        self.checkers_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "checkers_run", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_sent: self.files_sent.load(Ordering::Relaxed),
            files_simulated: self.files_simulated.load(Ordering::Relaxed),
            files_write_denied: self.files_write_denied.load(Ordering::Relaxed),
            hooks_run: self.hooks_run.load(Ordering::Relaxed),
            checkers_run: self.checkers_run.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub files_sent: u64,
    pub files_simulated: u64,
    pub files_write_denied: u64,
    pub hooks_run: u64,
    pub checkers_run: u64,
}
