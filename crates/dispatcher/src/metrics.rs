//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Successful append calls
    append_count: AtomicU64,
    /// Rows written (header excluded)
    row_count: AtomicU64,
    /// Failed append calls
    failure_count: AtomicU64,
    /// Bytes written, header included
    bytes_written: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_count(&self) -> u64 {
        self.append_count.load(Ordering::Relaxed)
    }

    pub fn row_count(&self) -> u64 {
        self.row_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Record one successful append
    pub fn record_append(&self, rows: usize, bytes: usize) {
        self.append_count.fetch_add(1, Ordering::Relaxed);
        self.row_count.fetch_add(rows as u64, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            append_count: self.append_count(),
            row_count: self.row_count(),
            failure_count: self.failure_count(),
            bytes_written: self.bytes_written(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub append_count: u64,
    pub row_count: u64,
    pub failure_count: u64,
    pub bytes_written: u64,
}
