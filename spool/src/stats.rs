//! Region counters, updated by the writer thread and readable from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Stats {
    writes: AtomicU64,
    bytes_written: AtomicU64,
    writes_rejected: AtomicU64,
    writes_failed: AtomicU64,
    flushes: AtomicU64,
    flushes_empty: AtomicU64,
    flushes_failed: AtomicU64,
    bytes_flushed: AtomicU64,
    segments_created: AtomicU64,
    segments_evicted: AtomicU64,
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub writes: u64,
    pub bytes_written: u64,
    /// Writes dropped for exceeding the buffer capacity
    pub writes_rejected: u64,
    /// Writes dropped because the overflow flush failed
    pub writes_failed: u64,
    pub flushes: u64,
    pub flushes_empty: u64,
    pub flushes_failed: u64,
    pub bytes_flushed: u64,
    pub segments_created: u64,
    pub segments_evicted: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_write(&self, bytes: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self, bytes: usize, created: bool, evicted: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes as u64, Ordering::Relaxed);
        if created {
            self.segments_created.fetch_add(1, Ordering::Relaxed);
        }
        self.segments_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_empty_flush(&self) {
        self.flushes_empty.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed_flush(&self) {
        self.flushes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            flushes_empty: self.flushes_empty.load(Ordering::Relaxed),
            flushes_failed: self.flushes_failed.load(Ordering::Relaxed),
            bytes_flushed: self.bytes_flushed.load(Ordering::Relaxed),
            segments_created: self.segments_created.load(Ordering::Relaxed),
            segments_evicted: self.segments_evicted.load(Ordering::Relaxed),
        }
    }
}
