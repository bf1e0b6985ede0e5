//! Region configuration.

use crate::header::HEADER_SIZE;
use crate::{Result, SpoolError};
use std::path::{Path, PathBuf};

/// Default mapped buffer size (50KB)
pub const DEFAULT_CACHE_SIZE: usize = 50 * 1024;
/// Default per-segment size cap (10MB)
pub const DEFAULT_SEGMENT_SIZE: u64 = 10 * 1024 * 1024;
/// Default total segment quota (100MB)
pub const DEFAULT_TOTAL_SIZE: u64 = 100 * 1024 * 1024;

pub const DEFAULT_BUFFER_FILE: &str = "cache.mmap";
pub const DEFAULT_SEGMENT_DIR: &str = "files";

/// Configuration for a [`Region`](crate::Region).
///
/// The mapped buffer size and the disk limits are independent: `cache_size`
/// bounds memory, `segment_size` and `total_size` bound disk usage.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Directory holding the buffer file and the segment directory
    pub root: PathBuf,
    /// Buffer file name, relative to `root`
    pub buffer_file: PathBuf,
    /// Segment directory, relative to `root`
    pub segment_dir: PathBuf,
    /// Mapped buffer size in bytes, header included
    pub cache_size: usize,
    /// Segment size at which a new segment is started
    pub segment_size: u64,
    /// Total size of all segments
    pub total_size: u64,
}

impl RegionConfig {
    /// Create a configuration rooted at `root` with a total segment quota.
    pub fn new<P: AsRef<Path>>(root: P, total_size: u64) -> Result<Self> {
        if total_size == 0 {
            return Err(SpoolError::config("total size must be greater than 0"));
        }

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            buffer_file: PathBuf::from(DEFAULT_BUFFER_FILE),
            segment_dir: PathBuf::from(DEFAULT_SEGMENT_DIR),
            cache_size: DEFAULT_CACHE_SIZE,
            segment_size: DEFAULT_SEGMENT_SIZE,
            total_size,
        })
    }

    /// Set the mapped buffer size (header included).
    pub fn with_cache_size(mut self, cache_size: usize) -> Result<Self> {
        if cache_size <= HEADER_SIZE {
            return Err(SpoolError::config(format!(
                "cache size must exceed header size ({} bytes)",
                HEADER_SIZE
            )));
        }
        self.cache_size = cache_size;
        Ok(self)
    }

    pub fn with_segment_size(mut self, segment_size: u64) -> Result<Self> {
        if segment_size == 0 {
            return Err(SpoolError::config("segment size must be greater than 0"));
        }
        self.segment_size = segment_size;
        Ok(self)
    }

    pub fn with_buffer_file<P: AsRef<Path>>(mut self, name: P) -> Self {
        self.buffer_file = name.as_ref().to_path_buf();
        self
    }

    pub fn with_segment_dir<P: AsRef<Path>>(mut self, name: P) -> Self {
        self.segment_dir = name.as_ref().to_path_buf();
        self
    }

    pub fn buffer_path(&self) -> PathBuf {
        self.root.join(&self.buffer_file)
    }

    pub fn segment_path(&self) -> PathBuf {
        self.root.join(&self.segment_dir)
    }
}
