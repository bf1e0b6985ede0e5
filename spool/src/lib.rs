//! Memory-mapped write-ahead buffer.
//!
//! - `Region` - async front end, one background writer per region
//! - `MappedBuffer` - mmap staging area with a persisted header
//! - `SegmentStore` - rotating segment files under a total size quota
//!
//! ```rust,ignore
//! use spool::{Region, RegionConfig};
//!
//! let region = Region::create(RegionConfig::new("/var/log/app", 100 * 1024 * 1024)?)?;
//! region.write(b"hello\n")?;
//! region.flush()?;
//! region.close()?;
//! ```

// Tracing macros - no-op when feature disabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug { ($($arg:tt)*) => {} }

#[cfg(feature = "tracing")]
macro_rules! trace_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn { ($($arg:tt)*) => {} }

pub mod buffer;
pub mod config;
pub mod fs;
pub mod header;
pub mod queue;
pub mod region;
pub mod segment;
pub mod stats;

pub use buffer::MappedBuffer;
pub use config::RegionConfig;
pub use header::{BufferHeader, HEADER_SIZE, MAGIC};
pub use queue::TaskQueue;
pub use region::Region;
pub use segment::{FlushReport, SegmentSink, SegmentStore};
pub use stats::{Stats, StatsSnapshot};

pub type Result<T> = std::result::Result<T, SpoolError>;

#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("write of {len} bytes exceeds buffer payload capacity {capacity}")]
    TooLarge { len: usize, capacity: usize },
    #[error("nothing to flush")]
    Empty,
    #[error("region closed")]
    Closed,
    #[error("config: {0}")]
    Config(String),
}

impl SpoolError {
    pub fn config(msg: impl Into<String>) -> Self {
        SpoolError::Config(msg.into())
    }

    /// True for the empty-buffer flush outcome, which is not a failure.
    pub fn is_empty(&self) -> bool {
        matches!(self, SpoolError::Empty)
    }
}
