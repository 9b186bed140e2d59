//! Memory list stream (`MemoryListStream`, type 5).
//!
//! A `u32` range count followed by fixed 16-byte `MINIDUMP_MEMORY_DESCRIPTOR` records.
//! Each record names a virtual address range of the target process and the location of
//! its captured bytes within the container.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{
        directory::DirectoryEntry,
        streams::{stream_slice, LocationDescriptor},
    },
    Result,
};

/// Size in bytes of one on-disk memory descriptor.
pub const MEMORY_DESCRIPTOR_SIZE: usize = 16;

/// One captured memory range: a virtual address and the location of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor {
    /// Starting virtual address of the range in the target process
    pub start_of_memory_range: u64,
    /// Location of the captured bytes within the container
    pub memory: LocationDescriptor,
}

impl MemoryDescriptor {
    /// Reads a memory descriptor at `offset`, advancing it by 16.
    pub(crate) fn read(data: &[u8], offset: &mut usize) -> Result<MemoryDescriptor> {
        let start_of_memory_range = read_le_at::<u64>(data, offset)?;
        let memory = LocationDescriptor::read(data, offset)?;

        Ok(MemoryDescriptor {
            start_of_memory_range,
            memory,
        })
    }
}

/// Decodes the memory list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared range count does not match
/// the count computed from the stream length.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<MemoryDescriptor>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < 4 {
        return Err(stream_error!(
            "Memory list of {} bytes is shorter than its count field",
            data.len()
        ));
    }

    let mut offset = 0;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;
    let computed = (data.len() - 4) / MEMORY_DESCRIPTOR_SIZE;
    if declared != computed {
        return Err(stream_error!(
            "Memory range count mismatch - declared {}, computed {}",
            declared,
            computed
        ));
    }

    let mut ranges = Vec::with_capacity(declared);
    for _ in 0..declared {
        ranges.push(MemoryDescriptor::read(data, &mut offset)?);
    }

    Ok(ranges)
}
