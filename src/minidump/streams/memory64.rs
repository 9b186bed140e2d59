//! Full-memory range table (`Memory64ListStream`, type 9).
//!
//! Full-memory dumps store every captured range's bytes contiguously, back to back,
//! starting at a single base offset. The stream itself is only a table: a `u64` range
//! count, the `u64` base offset, and fixed 16-byte `(start, size)` records. A range's
//! bytes live at `base_rva` plus the sizes of all ranges before it.
//!
//! The range count is the format's one genuinely attacker-controlled 64-bit count, so
//! the decoder validates it against the stream length with checked arithmetic before
//! allocating anything.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};

/// Size in bytes of the stream's fixed header (count + base offset).
pub const MEMORY64_HEADER_SIZE: usize = 16;

/// Size in bytes of one on-disk range record.
pub const MEMORY64_RANGE_SIZE: usize = 16;

/// One captured range of the full-memory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange64 {
    /// Starting virtual address of the range in the target process
    pub start_of_memory_range: u64,
    /// Size of the range in bytes
    pub data_size: u64,
}

/// The decoded full-memory range table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory64List {
    /// File offset where the first range's bytes begin
    pub base_rva: u64,
    /// All captured ranges, in file order
    pub ranges: Vec<MemoryRange64>,
}

impl Memory64List {
    /// Computes the file offset of one range's captured bytes.
    ///
    /// Ranges are stored contiguously from `base_rva`, so the offset of range `index`
    /// is the base plus the sizes of all preceding ranges. Returns `None` if `index`
    /// is out of range or the running sum overflows.
    #[must_use]
    pub fn range_file_offset(&self, index: usize) -> Option<u64> {
        if index >= self.ranges.len() {
            return None;
        }

        let mut offset = self.base_rva;
        for range in &self.ranges[..index] {
            offset = offset.checked_add(range.data_size)?;
        }
        Some(offset)
    }
}

/// Decodes the full-memory range table.
///
/// Only the table is decoded; the (potentially huge) range contents are never touched.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared range count does not fit in
/// the stream, or overflows.
pub(crate) fn decode(source: &dyn Backend, entry: &DirectoryEntry) -> Result<Memory64List> {
    let data = stream_slice(source, entry)?;
    if data.len() < MEMORY64_HEADER_SIZE {
        return Err(stream_error!(
            "Memory64 stream of {} bytes is shorter than its header",
            data.len()
        ));
    }

    let mut offset = 0;
    let declared = read_le_at::<u64>(data, &mut offset)?;
    let base_rva = read_le_at::<u64>(data, &mut offset)?;

    let Some(table_len) = declared.checked_mul(MEMORY64_RANGE_SIZE as u64) else {
        return Err(stream_error!(
            "Memory64 range count causes overflow - {}",
            declared
        ));
    };
    if table_len > (data.len() - MEMORY64_HEADER_SIZE) as u64 {
        return Err(stream_error!(
            "Memory64 declares {} ranges but only {} table bytes follow",
            declared,
            data.len() - MEMORY64_HEADER_SIZE
        ));
    }

    #[allow(clippy::cast_possible_truncation)]
    let count = declared as usize;
    let mut ranges = Vec::with_capacity(count);
    for _ in 0..count {
        let start_of_memory_range = read_le_at::<u64>(data, &mut offset)?;
        let data_size = read_le_at::<u64>(data, &mut offset)?;
        ranges.push(MemoryRange64 {
            start_of_memory_range,
            data_size,
        });
    }

    Ok(Memory64List { base_rva, ranges })
}
