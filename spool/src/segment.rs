//! Segment rotation and retention.
//!
//! Flushed payloads are appended to the newest segment file until it reaches
//! `segment_size`, then a new timestamp-named segment is started. After every
//! append the oldest segments are deleted until the directory fits in
//! `total_size`.

use crate::fs::{self, FileEntry};
use crate::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Segment file extension.
pub const SEGMENT_EXT: &str = "mmap";

/// Outcome of a successful flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    /// Segment the payload was appended to
    pub segment: PathBuf,
    /// Payload bytes appended
    pub bytes: usize,
    /// Whether `segment` was created by this flush
    pub created: bool,
    /// Segments deleted by retention, oldest first
    pub evicted: Vec<PathBuf>,
}

/// Durable destination for flushed buffer payloads.
pub trait SegmentSink {
    /// Persist `payload` in full. On error nothing may be assumed written.
    fn persist(&mut self, payload: &[u8]) -> Result<FlushReport>;
}

/// Rotating segment files in one directory, capped in total size.
#[derive(Debug)]
pub struct SegmentStore {
    dir: PathBuf,
    segment_size: u64,
    total_size: u64,
    last_stamp: String,
    stamp_seq: u32,
}

impl SegmentStore {
    pub fn new<P: AsRef<Path>>(dir: P, segment_size: u64, total_size: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            segment_size,
            total_size,
            last_stamp: String::new(),
            stamp_seq: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Segments currently on disk, oldest first.
    pub fn segments(&self) -> Result<Vec<FileEntry>> {
        Ok(fs::list_files(&self.dir)?)
    }

    /// Pick the append target: the newest segment while it is under
    /// `segment_size`, otherwise a fresh path. Returns `(path, created)`.
    fn select_target(&mut self, segments: &[FileEntry]) -> (PathBuf, bool) {
        match segments.last() {
            Some(newest) if newest.len < self.segment_size => (newest.path.clone(), false),
            _ => (self.next_segment_path(), true),
        }
    }

    /// `YYYYMMDD_HHMMSS_mmm.mmap` in local time. Names within the same
    /// millisecond (or after the clock stepped back) get a `_nnn` suffix so
    /// they keep sorting after the previous one.
    fn next_segment_path(&mut self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        if stamp > self.last_stamp {
            self.last_stamp = stamp;
            self.stamp_seq = 0;
        } else {
            self.stamp_seq += 1;
        }

        loop {
            let name = if self.stamp_seq == 0 {
                format!("{}.{}", self.last_stamp, SEGMENT_EXT)
            } else {
                format!("{}_{:03}.{}", self.last_stamp, self.stamp_seq, SEGMENT_EXT)
            };
            let path = self.dir.join(name);
            if !path.exists() {
                return path;
            }
            self.stamp_seq += 1;
        }
    }

    /// Delete oldest segments until the total fits the quota, never touching
    /// `active`.
    pub fn enforce_retention(&self, active: Option<&Path>) -> Result<Vec<PathBuf>> {
        let segments = fs::list_files(&self.dir)?;
        let evicted = fs::evict_oldest(&segments, self.total_size, active)?;
        for path in &evicted {
            trace_debug!(segment = %path.display(), "evicted segment");
        }
        Ok(evicted)
    }
}

impl SegmentSink for SegmentStore {
    fn persist(&mut self, payload: &[u8]) -> Result<FlushReport> {
        let segments = fs::list_files(&self.dir)?;
        let (segment, created) = self.select_target(&segments);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&segment)?;
        file.write_all(payload)?;
        file.sync_data()?;
        drop(file);

        if created {
            trace_debug!(segment = %segment.display(), "created segment");
        }

        // Listing again so the active segment's real size is counted
        let evicted = self.enforce_retention(Some(&segment))?;

        Ok(FlushReport {
            segment,
            bytes: payload.len(),
            created,
            evicted,
        })
    }
}
