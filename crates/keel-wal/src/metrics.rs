//! Counter metrics for the write path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of [`WriterMetrics`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WriterMetricsSnapshot {
    /// Bytes logically appended by callers.
    pub appended_bytes: u64,
    /// Individual write calls issued to the sink.
    pub sink_writes: u64,
    /// Bytes carried by sink write calls (includes direct-I/O padding).
    pub sink_written_bytes: u64,
    /// Buffer drains pushed through to the sink.
    pub flushes: u64,
    /// Data-only syncs issued.
    pub syncs: u64,
    /// Full fsyncs issued.
    pub fsyncs: u64,
    /// Range syncs issued.
    pub range_syncs: u64,
    /// Staging-buffer reallocations taken to absorb an append.
    pub buffer_grows: u64,
}

/// Thread-safe counters tracking sink traffic for one writer.
///
/// All operations are lock-free; snapshots are not atomic across fields.
#[derive(Debug, Default)]
pub struct WriterMetrics {
    appended_bytes: AtomicU64,
    sink_writes: AtomicU64,
    sink_written_bytes: AtomicU64,
    flushes: AtomicU64,
    syncs: AtomicU64,
    fsyncs: AtomicU64,
    range_syncs: AtomicU64,
    buffer_grows: AtomicU64,
}

impl WriterMetrics {
    pub fn record_append(&self, bytes: u64) {
        self.appended_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_sink_write(&self, bytes: u64) {
        self.sink_writes.fetch_add(1, Ordering::Relaxed);
        self.sink_written_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync(&self, fsync: bool) {
        if fsync {
            self.fsyncs.fetch_add(1, Ordering::Relaxed);
        } else {
            self.syncs.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_range_sync(&self) {
        self.range_syncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffer_grow(&self) {
        self.buffer_grows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WriterMetricsSnapshot {
        WriterMetricsSnapshot {
            appended_bytes: self.appended_bytes.load(Ordering::Relaxed),
            sink_writes: self.sink_writes.load(Ordering::Relaxed),
            sink_written_bytes: self.sink_written_bytes.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            syncs: self.syncs.load(Ordering::Relaxed),
            fsyncs: self.fsyncs.load(Ordering::Relaxed),
            range_syncs: self.range_syncs.load(Ordering::Relaxed),
            buffer_grows: self.buffer_grows.load(Ordering::Relaxed),
        }
    }
}
