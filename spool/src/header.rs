//! Persisted buffer header.

use bytemuck::{Pod, Zeroable};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 12;

/// Sentinel identifying an initialized buffer ("MMAP").
pub const MAGIC: u32 = 0x4D4D_4150;

/// Magic written by the older layout. Never accepted as valid.
pub const LEGACY_MAGIC: u32 = 0x5841_5548;

/// Buffer header (12 bytes), stored at the start of the mapped region.
///
/// Layout:
/// ```text
/// Offset  Size  Field
/// 0       4     magic
/// 4       8     write_offset
/// ```
///
/// `write_offset` counts from the start of the region, header included, so an
/// empty buffer has `write_offset == HEADER_SIZE`. Both fields are little-endian.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BufferHeader {
    /// Format sentinel, see [`MAGIC`]
    pub magic: u32,
    /// Offset of the next free byte
    pub write_offset: u64,
}

impl BufferHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Header of an empty, freshly initialized buffer.
    #[inline]
    pub fn empty() -> Self {
        Self::with_offset(HEADER_SIZE)
    }

    #[inline]
    pub fn with_offset(write_offset: usize) -> Self {
        Self {
            magic: MAGIC.to_le(),
            write_offset: (write_offset as u64).to_le(),
        }
    }

    /// Read a header from the first `HEADER_SIZE` bytes of `bytes`.
    ///
    /// Returns `None` if `bytes` is too short.
    #[inline]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..HEADER_SIZE)
            .map(bytemuck::pod_read_unaligned::<Self>)
    }

    /// Write this header into the first `HEADER_SIZE` bytes of `bytes`.
    #[inline]
    pub fn write_to(&self, bytes: &mut [u8]) {
        bytes[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(self));
    }

    #[inline]
    pub fn magic(&self) -> u32 {
        u32::from_le(self.magic)
    }

    #[inline]
    pub fn write_offset(&self) -> usize {
        u64::from_le(self.write_offset) as usize
    }

    /// A header is valid when the magic matches and the offset lies within
    /// `HEADER_SIZE..=capacity`.
    #[inline]
    pub fn is_valid(&self, capacity: usize) -> bool {
        let offset = self.write_offset();
        self.magic() == MAGIC && (HEADER_SIZE..=capacity).contains(&offset)
    }
}

const _: () = assert!(std::mem::size_of::<BufferHeader>() == HEADER_SIZE);
