//! Virtual address space regions (`MemoryInfoListStream`, type 16).
//!
//! A self-describing header (`SizeOfHeader`, `SizeOfEntry`, `u64` entry count) followed
//! by region records. The stride comes from the header rather than the struct size, so
//! dumps written by newer tools with larger records stay readable: the known prefix of
//! each record is decoded and the tail skipped.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};
use bitflags::bitflags;

/// Size in bytes of the known on-disk region record.
pub const MEMORY_INFO_RECORD_SIZE: usize = 48;

/// Size in bytes of the stream's own header.
pub const MEMORY_INFO_HEADER_SIZE: usize = 16;

bitflags! {
    /// Page protection flags (`PAGE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryProtection: u32 {
        /// No access
        const NOACCESS = 0x0000_0001;
        /// Read-only
        const READONLY = 0x0000_0002;
        /// Read/write
        const READWRITE = 0x0000_0004;
        /// Copy-on-write
        const WRITECOPY = 0x0000_0008;
        /// Execute-only
        const EXECUTE = 0x0000_0010;
        /// Execute and read
        const EXECUTE_READ = 0x0000_0020;
        /// Execute, read, and write
        const EXECUTE_READWRITE = 0x0000_0040;
        /// Execute and copy-on-write
        const EXECUTE_WRITECOPY = 0x0000_0080;
        /// Guard page
        const GUARD = 0x0000_0100;
        /// Non-cacheable
        const NOCACHE = 0x0000_0200;
        /// Write-combined
        const WRITECOMBINE = 0x0000_0400;
    }
}

bitflags! {
    /// Region state flags (`MEM_COMMIT` and friends).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryRegionState: u32 {
        /// Committed pages with backing storage
        const COMMIT = 0x0000_1000;
        /// Reserved address space without storage
        const RESERVE = 0x0000_2000;
        /// Free address space
        const FREE = 0x0001_0000;
    }
}

bitflags! {
    /// Region type flags (`MEM_PRIVATE` and friends).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryRegionType: u32 {
        /// Private to the process
        const PRIVATE = 0x0002_0000;
        /// Mapped view of a section
        const MAPPED = 0x0004_0000;
        /// Mapped view of an image section
        const IMAGE = 0x0100_0000;
    }
}

/// One region of the target's virtual address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfoEntry {
    /// Base address of the region
    pub base_address: u64,
    /// Base address of the allocation this region belongs to
    pub allocation_base: u64,
    /// Protection the allocation was created with
    pub allocation_protect: MemoryProtection,
    /// Size of the region in bytes
    pub region_size: u64,
    /// Commit state of the region
    pub state: MemoryRegionState,
    /// Current protection of the region
    pub protect: MemoryProtection,
    /// Whether the region is private, mapped, or an image
    pub region_type: MemoryRegionType,
}

/// Decodes the memory info list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the header sizes are smaller than the
/// known layouts, or if the declared entries do not fit in the stream.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<MemoryInfoEntry>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < MEMORY_INFO_HEADER_SIZE {
        return Err(stream_error!(
            "Memory info stream of {} bytes is shorter than its header",
            data.len()
        ));
    }

    let mut offset = 0;
    let size_of_header = read_le_at::<u32>(data, &mut offset)? as usize;
    let size_of_entry = read_le_at::<u32>(data, &mut offset)? as usize;
    let declared = read_le_at::<u64>(data, &mut offset)?;

    if size_of_header < MEMORY_INFO_HEADER_SIZE || size_of_header > data.len() {
        return Err(stream_error!(
            "Memory info header size {} is implausible for a {} byte stream",
            size_of_header,
            data.len()
        ));
    }
    if size_of_entry < MEMORY_INFO_RECORD_SIZE {
        return Err(stream_error!(
            "Memory info entry size {} is below the known layout",
            size_of_entry
        ));
    }

    let available = (data.len() - size_of_header) as u64;
    let Some(table_len) = declared.checked_mul(size_of_entry as u64) else {
        return Err(stream_error!(
            "Memory info entry count causes overflow - {}",
            declared
        ));
    };
    if table_len > available {
        return Err(stream_error!(
            "Memory info declares {} entries but only {} bytes follow the header",
            declared,
            available
        ));
    }

    #[allow(clippy::cast_possible_truncation)]
    let count = declared as usize;
    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
        let mut offset = size_of_header + index * size_of_entry;

        let base_address = read_le_at::<u64>(data, &mut offset)?;
        let allocation_base = read_le_at::<u64>(data, &mut offset)?;
        let allocation_protect =
            MemoryProtection::from_bits_retain(read_le_at::<u32>(data, &mut offset)?);
        offset += 4; // alignment
        let region_size = read_le_at::<u64>(data, &mut offset)?;
        let state = MemoryRegionState::from_bits_retain(read_le_at::<u32>(data, &mut offset)?);
        let protect = MemoryProtection::from_bits_retain(read_le_at::<u32>(data, &mut offset)?);
        let region_type =
            MemoryRegionType::from_bits_retain(read_le_at::<u32>(data, &mut offset)?);

        entries.push(MemoryInfoEntry {
            base_address,
            allocation_base,
            allocation_protect,
            region_size,
            state,
            protect,
            region_type,
        });
    }

    Ok(entries)
}
