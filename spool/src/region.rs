//! Region: mapped buffer + segment store behind a single background writer.
//!
//! ```text
//! write()/flush() ──► TaskQueue ──► Writer thread
//!                                     ├─ MappedBuffer (cache.mmap)
//!                                     └─ SegmentStore (files/*.mmap)
//! ```
//!
//! `write` and `flush` only enqueue; all mmap and file I/O happens on the
//! writer thread, in call order. Errors on that thread are logged and counted
//! in [`Stats`], since the caller has already returned.

use crate::buffer::MappedBuffer;
use crate::config::RegionConfig;
use crate::fs;
use crate::queue::TaskQueue;
use crate::segment::{FlushReport, SegmentStore};
use crate::stats::{Stats, StatsSnapshot};
use crate::{Result, SpoolError};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

const WRITER_THREAD: &str = "spool-writer";

/// State owned by the writer thread.
struct Writer {
    buffer: MappedBuffer,
    segments: SegmentStore,
    stats: Arc<Stats>,
}

impl Writer {
    fn write(&mut self, data: &[u8]) {
        match self.buffer.write_sync(data, &mut self.segments) {
            Ok(flushed) => {
                if let Some(report) = flushed {
                    self.record_flush(&report);
                }
                self.stats.record_write(data.len());
            }
            Err(SpoolError::TooLarge { len, capacity }) => {
                self.stats.record_rejected();
                trace_warn!(len, capacity, "write dropped: larger than buffer");
            }
            Err(e) => {
                self.stats.record_write_failed();
                trace_warn!(error = %e, len = data.len(), "write dropped: overflow flush failed");
            }
        }
    }

    fn flush(&mut self) -> Result<FlushReport> {
        let result = self.buffer.flush_sync(&mut self.segments);
        match &result {
            Ok(report) => self.record_flush(report),
            Err(SpoolError::Empty) => {
                self.stats.record_empty_flush();
                trace_debug!("flush skipped: buffer empty");
            }
            Err(e) => {
                self.stats.record_failed_flush();
                trace_warn!(error = %e, buffered = self.buffer.len(), "flush failed, bytes kept");
            }
        }
        result
    }

    fn record_flush(&self, report: &FlushReport) {
        self.stats
            .record_flush(report.bytes, report.created, report.evicted.len());
        trace_debug!(
            segment = %report.segment.display(),
            bytes = report.bytes,
            evicted = report.evicted.len(),
            "flushed"
        );
    }
}

/// Write-ahead buffer region.
///
/// Owns one writer thread for its lifetime. Dropping the region (or calling
/// [`close`](Region::close)) flushes what is buffered, waits for every queued
/// task, and then unmaps the buffer.
pub struct Region {
    queue: TaskQueue<Writer>,
    stats: Arc<Stats>,
    config: RegionConfig,
}

impl Region {
    /// Prepare the directory layout, map the buffer and start the writer.
    ///
    /// Fails if the buffer file cannot be created, sized or mapped; a region
    /// is never returned half-initialized.
    pub fn create(config: RegionConfig) -> Result<Self> {
        let buffer_path = config.buffer_path();
        let segment_path = config.segment_path();

        fs::ensure_file(&buffer_path)?;
        fs::ensure_dir(&segment_path)?;

        let buffer = MappedBuffer::open(&buffer_path, config.cache_size)?;
        let segments = SegmentStore::new(&segment_path, config.segment_size, config.total_size);
        let stats = Arc::new(Stats::new());

        trace_debug!(
            root = %config.root.display(),
            buffered = buffer.len(),
            "region opened"
        );

        let writer = Writer {
            buffer,
            segments,
            stats: stats.clone(),
        };
        let queue = TaskQueue::spawn(WRITER_THREAD, writer)?;

        Ok(Self {
            queue,
            stats,
            config,
        })
    }

    /// Shorthand for `create` with default buffer and segment sizes.
    pub fn open<P: AsRef<Path>>(root: P, total_size: u64) -> Result<Self> {
        Self::create(RegionConfig::new(root, total_size)?)
    }

    /// Queue `data` for appending. Returns immediately.
    ///
    /// Only fails if the region is closed. A write larger than the buffer is
    /// dropped on the writer thread and counted in `writes_rejected`.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let data = data.to_vec();
        self.queue.post(move |writer| writer.write(&data))
    }

    /// Queue a flush of the buffer into the segment files. Returns immediately.
    pub fn flush(&self) -> Result<()> {
        self.queue.post(|writer| {
            let _ = writer.flush();
        })
    }

    /// Queue a flush and wait for it.
    ///
    /// Every write queued before this call is flushed too. Returns `None` if
    /// there was nothing to flush.
    pub fn sync(&self) -> Result<Option<FlushReport>> {
        let rx = self.post_flush()?;
        match rx.recv() {
            Ok(Ok(report)) => Ok(Some(report)),
            Ok(Err(SpoolError::Empty)) => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SpoolError::Closed),
        }
    }

    /// Flush, drain the queue, stop the writer and unmap the buffer.
    ///
    /// Returns the outcome of the final flush.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Tasks queued and not yet started.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    fn post_flush(&self) -> Result<mpsc::Receiver<Result<FlushReport>>> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.queue.post(move |writer| {
            let _ = tx.send(writer.flush());
        })?;
        Ok(rx)
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.queue.is_closed() {
            return Ok(());
        }
        let rx = self.post_flush()?;

        // Joins only after every queued task, the final flush included, has run.
        // The buffer is unmapped when the returned writer drops.
        drop(self.queue.shutdown());

        match rx.try_recv() {
            Ok(Ok(_)) | Ok(Err(SpoolError::Empty)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SpoolError::Closed),
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            trace_warn!(error = %e, root = %self.config.root.display(), "final flush failed");
        }
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("root", &self.config.root)
            .field("pending", &self.queue.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use tempfile::tempdir;

    fn small_config(root: &Path) -> RegionConfig {
        RegionConfig::new(root, 100_000)
            .unwrap()
            .with_cache_size(1000)
            .unwrap()
            .with_segment_size(10_000)
            .unwrap()
    }

    fn segment_bytes(region_root: &Path) -> Vec<u8> {
        let files = fs::list_files(&region_root.join("files")).unwrap();
        files
            .iter()
            .flat_map(|f| std::fs::read(&f.path).unwrap())
            .collect()
    }

    #[test]
    fn test_create_layout() {
        let dir = tempdir().unwrap();
        let region = Region::open(dir.path(), 1024 * 1024).unwrap();
        assert!(dir.path().join("cache.mmap").is_file());
        assert!(dir.path().join("files").is_dir());
        region.close().unwrap();
    }

    #[test]
    fn test_write_then_sync() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();

        region.write(b"hello ").unwrap();
        region.write(b"world").unwrap();
        let report = region.sync().unwrap().unwrap();

        assert_eq!(report.bytes, 11);
        assert!(report.created);
        assert_eq!(std::fs::read(&report.segment).unwrap(), b"hello world");
        assert!(region.sync().unwrap().is_none());

        let stats = region.stats();
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.flushes_empty, 1);
    }

    #[test]
    fn test_close_flushes_buffered() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();
        for i in 0..10u8 {
            region.write(&[i; 10]).unwrap();
        }
        region.close().unwrap();

        let expected: Vec<u8> = (0..10u8).flat_map(|i| [i; 10]).collect();
        assert_eq!(segment_bytes(dir.path()), expected);

        let buffer = MappedBuffer::open(dir.path().join("cache.mmap"), 1000).unwrap();
        assert_eq!(buffer.write_offset(), HEADER_SIZE);
    }

    #[test]
    fn test_drop_flushes_buffered() {
        let dir = tempdir().unwrap();
        {
            let region = Region::create(small_config(dir.path())).unwrap();
            region.write(b"dropped but kept").unwrap();
        }
        assert_eq!(segment_bytes(dir.path()), b"dropped but kept");
    }

    #[test]
    fn test_recovers_unflushed_bytes() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        fs::ensure_dir(&config.segment_path()).unwrap();

        // Leftover from a process that died before flushing
        let mut buffer = MappedBuffer::open(config.buffer_path(), config.cache_size).unwrap();
        let mut unused = SegmentStore::new(config.segment_path(), 1, 1);
        buffer.write_sync(b"survivor", &mut unused).unwrap();
        drop(buffer);

        let region = Region::create(config).unwrap();
        region.write(b"+new").unwrap();
        region.close().unwrap();

        assert_eq!(segment_bytes(dir.path()), b"survivor+new");
    }

    #[test]
    fn test_oversized_write_dropped() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();

        region.write(&[0u8; 1500]).unwrap();
        region.write(b"ok").unwrap();
        let report = region.sync().unwrap().unwrap();

        assert_eq!(report.bytes, 2);
        let stats = region.stats();
        assert_eq!(stats.writes_rejected, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn test_overflow_flush_on_writer() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();

        // 988 payload bytes per buffer; the 11th write overflows
        for _ in 0..12 {
            region.write(&[9u8; 90]).unwrap();
        }
        let report = region.sync().unwrap().unwrap();

        assert_eq!(report.bytes, 2 * 90);
        let stats = region.stats();
        assert_eq!(stats.flushes, 2);
        assert_eq!(stats.bytes_flushed, 12 * 90);
        assert_eq!(segment_bytes(dir.path()).len(), 12 * 90);
    }

    #[test]
    fn test_shared_across_threads() {
        let dir = tempdir().unwrap();
        let region = Arc::new(Region::create(small_config(dir.path())).unwrap());

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let region = region.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        region.write(&[t; 7]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        region.sync().unwrap();
        assert_eq!(segment_bytes(dir.path()).len(), 4 * 50 * 7);
        assert_eq!(region.stats().writes, 200);
        assert_eq!(region.pending(), 0);
    }

    #[test]
    fn test_config_kept() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();
        let config = region.config();
        assert_eq!(config.cache_size, 1000);
        assert_eq!(config.segment_size, 10_000);
        assert_eq!(config.total_size, 100_000);
        assert_eq!(config.buffer_path(), dir.path().join("cache.mmap"));
    }

    #[test]
    fn test_create_fails_when_root_is_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"x").unwrap();

        let err = Region::create(small_config(&root)).unwrap_err();
        assert!(matches!(err, SpoolError::Io(_)), "{err:?}");
        assert_eq!(std::fs::read(&root).unwrap(), b"x");
    }

    #[test]
    fn test_create_fails_when_buffer_is_dir() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cache.mmap")).unwrap();

        let err = Region::create(small_config(dir.path())).unwrap_err();
        assert!(matches!(err, SpoolError::Io(_)), "{err:?}");
        // Failed before the segment dir was prepared or the writer started
        assert!(!dir.path().join("files").exists());

        std::fs::remove_dir(dir.path().join("cache.mmap")).unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();
        region.write(b"retry").unwrap();
        region.close().unwrap();
        assert_eq!(segment_bytes(dir.path()), b"retry");
    }

    #[test]
    fn test_sync_after_writer_panic() {
        let dir = tempdir().unwrap();
        let region = Region::create(small_config(dir.path())).unwrap();

        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        region
            .queue
            .post(move |_| {
                let _ = gate_rx.recv();
                panic!("writer task failed");
            })
            .unwrap();
        region.write(b"queued behind").unwrap();
        let rx = region.post_flush().unwrap();
        gate_tx.send(()).unwrap();

        // Queued flush is released instead of waiting forever
        assert!(rx.recv().is_err());
        assert!(matches!(region.sync(), Err(SpoolError::Closed)));
        assert!(matches!(region.write(b"late"), Err(SpoolError::Closed)));
        assert!(region.close().is_ok());
    }
}
