//! Memory-mapped staging buffer with a persisted header.
//!
//! The header is synced after every mutation, so a restart sees either the
//! last persisted offset or a freshly initialized buffer.

use crate::header::{BufferHeader, HEADER_SIZE};
use crate::segment::{FlushReport, SegmentSink};
use crate::{Result, SpoolError};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Fixed-size mmap buffer. Not thread-safe by design of its callers: one
/// owner mutates it at a time.
pub struct MappedBuffer {
    mmap: MmapMut,
    path: PathBuf,
    capacity: usize,
    write_offset: usize,
}

impl MappedBuffer {
    /// Open or create the backing file, size it to exactly `capacity` bytes and
    /// map it shared.
    ///
    /// Changing `capacity` across restarts is lossy: shrinking truncates, and a
    /// stored offset beyond the new capacity resets the buffer.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        if capacity <= HEADER_SIZE {
            return Err(SpoolError::config(format!(
                "buffer capacity must exceed header size ({} bytes)",
                HEADER_SIZE
            )));
        }

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.set_len(capacity as u64)?;

        let mut mmap = unsafe { MmapOptions::new().len(capacity).map_mut(&file)? };

        let write_offset = match BufferHeader::read(&mmap).filter(|h| h.is_valid(capacity)) {
            Some(header) => header.write_offset(),
            None => {
                trace_debug!(path = %path.display(), "initializing buffer");
                mmap.fill(0);
                BufferHeader::empty().write_to(&mut mmap);
                mmap.flush_range(0, HEADER_SIZE)?;
                HEADER_SIZE
            }
        };

        Ok(Self {
            mmap,
            path,
            capacity,
            write_offset,
        })
    }

    /// Append `data`, flushing to `sink` first if it would not fit.
    ///
    /// Returns the report of the overflow flush, if one happened. Writes larger
    /// than the payload capacity are rejected without touching the buffer.
    pub fn write_sync<S: SegmentSink + ?Sized>(
        &mut self,
        data: &[u8],
        sink: &mut S,
    ) -> Result<Option<FlushReport>> {
        if data.len() > self.payload_capacity() {
            return Err(SpoolError::TooLarge {
                len: data.len(),
                capacity: self.payload_capacity(),
            });
        }
        if data.is_empty() {
            return Ok(None);
        }

        let mut report = None;
        if self.write_offset + data.len() > self.capacity {
            report = Some(self.flush_sync(sink)?);
        }

        let end = self.write_offset + data.len();
        self.mmap[self.write_offset..end].copy_from_slice(data);
        self.write_offset = end;
        self.sync_header()?;

        Ok(report)
    }

    /// Hand the buffered payload to `sink`, then clear the buffer.
    ///
    /// Fails with [`SpoolError::Empty`] when nothing is buffered. If `sink`
    /// fails the payload stays buffered for the next attempt.
    pub fn flush_sync<S: SegmentSink + ?Sized>(&mut self, sink: &mut S) -> Result<FlushReport> {
        if self.write_offset == HEADER_SIZE {
            return Err(SpoolError::Empty);
        }

        let report = sink.persist(&self.mmap[HEADER_SIZE..self.write_offset])?;

        self.mmap.fill(0);
        self.write_offset = HEADER_SIZE;
        self.sync_header()?;

        Ok(report)
    }

    fn sync_header(&mut self) -> Result<()> {
        BufferHeader::with_offset(self.write_offset).write_to(&mut self.mmap);
        self.mmap.flush_range(0, HEADER_SIZE)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapped region, header included.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest single write that can ever land.
    pub fn payload_capacity(&self) -> usize {
        self.capacity - HEADER_SIZE
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Buffered bytes not yet flushed.
    pub fn payload(&self) -> &[u8] {
        &self.mmap[HEADER_SIZE..self.write_offset]
    }

    pub fn len(&self) -> usize {
        self.write_offset - HEADER_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == HEADER_SIZE
    }
}

impl Drop for MappedBuffer {
    fn drop(&mut self) {
        let _ = self.mmap.flush_async();
    }
}

impl std::fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("path", &self.path)
            .field("capacity", &self.capacity)
            .field("write_offset", &self.write_offset)
            .finish()
    }
}
