//! Extended thread accounting (`ThreadInfoListStream`, type 17).
//!
//! A self-describing header (`SizeOfHeader`, `SizeOfEntry`, `u32` count) followed by
//! fixed 64-byte `MINIDUMP_THREAD_INFO` records carrying timing, start address, and
//! affinity data the basic thread list does not.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};
use bitflags::bitflags;

/// Size in bytes of the stream's own header.
pub const THREAD_INFO_HEADER_SIZE: usize = 12;

/// Size in bytes of one on-disk thread info record.
pub const THREAD_INFO_RECORD_SIZE: usize = 64;

bitflags! {
    /// Per-thread capture status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThreadInfoFlags: u32 {
        /// Capturing this thread produced an error
        const ERROR_THREAD = 0x0000_0001;
        /// This thread was writing the dump
        const WRITING_THREAD = 0x0000_0002;
        /// The thread had exited before the capture
        const EXITED_THREAD = 0x0000_0004;
        /// The accounting fields are invalid
        const INVALID_INFO = 0x0000_0008;
        /// The captured context is invalid
        const INVALID_CONTEXT = 0x0000_0010;
        /// The TEB contents are invalid
        const INVALID_TEB = 0x0000_0020;
    }
}

/// Extended accounting for one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfoEntry {
    /// Thread id assigned by the operating system
    pub thread_id: u32,
    /// Capture status flags for this thread
    pub dump_flags: ThreadInfoFlags,
    /// Error code from capturing this thread, 0 on success
    pub dump_error: u32,
    /// Exit status for exited threads
    pub exit_status: u32,
    /// Creation time as a FILETIME value
    pub create_time: u64,
    /// Exit time as a FILETIME value, 0 for running threads
    pub exit_time: u64,
    /// Cumulative kernel-mode time
    pub kernel_time: u64,
    /// Cumulative user-mode time
    pub user_time: u64,
    /// Thread start address in the target process
    pub start_address: u64,
    /// Processor affinity mask
    pub affinity: u64,
}

/// Decodes the thread info list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the header sizes are smaller than the
/// known layouts or the declared entries do not fit in the stream.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<ThreadInfoEntry>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < THREAD_INFO_HEADER_SIZE {
        return Err(stream_error!(
            "Thread info stream of {} bytes is shorter than its header",
            data.len()
        ));
    }

    let mut offset = 0;
    let size_of_header = read_le_at::<u32>(data, &mut offset)? as usize;
    let size_of_entry = read_le_at::<u32>(data, &mut offset)? as usize;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;

    if size_of_header < THREAD_INFO_HEADER_SIZE || size_of_header > data.len() {
        return Err(stream_error!(
            "Thread info header size {} is implausible for a {} byte stream",
            size_of_header,
            data.len()
        ));
    }
    if size_of_entry < THREAD_INFO_RECORD_SIZE {
        return Err(stream_error!(
            "Thread info entry size {} is below the known layout",
            size_of_entry
        ));
    }

    let available = data.len() - size_of_header;
    let Some(table_len) = declared.checked_mul(size_of_entry) else {
        return Err(stream_error!(
            "Thread info entry count causes overflow - {}",
            declared
        ));
    };
    if table_len > available {
        return Err(stream_error!(
            "Thread info declares {} entries but only {} bytes follow the header",
            declared,
            available
        ));
    }

    let mut entries = Vec::with_capacity(declared);
    for index in 0..declared {
        let mut offset = size_of_header + index * size_of_entry;

        entries.push(ThreadInfoEntry {
            thread_id: read_le_at::<u32>(data, &mut offset)?,
            dump_flags: ThreadInfoFlags::from_bits_retain(read_le_at::<u32>(data, &mut offset)?),
            dump_error: read_le_at::<u32>(data, &mut offset)?,
            exit_status: read_le_at::<u32>(data, &mut offset)?,
            create_time: read_le_at::<u64>(data, &mut offset)?,
            exit_time: read_le_at::<u64>(data, &mut offset)?,
            kernel_time: read_le_at::<u64>(data, &mut offset)?,
            user_time: read_le_at::<u64>(data, &mut offset)?,
            start_address: read_le_at::<u64>(data, &mut offset)?,
            affinity: read_le_at::<u64>(data, &mut offset)?,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    fn entry(length: u32) -> DirectoryEntry {
        DirectoryEntry {
            stream_type: crate::StreamType::ThreadInfoList.raw(),
            length,
            rva: 0,
        }
    }

    #[test]
    fn crafted() {
        let mut data = Vec::new();
        data.extend_from_slice(&(THREAD_INFO_HEADER_SIZE as u32).to_le_bytes());
        data.extend_from_slice(&(THREAD_INFO_RECORD_SIZE as u32).to_le_bytes());
        data.extend_from_slice(&1_u32.to_le_bytes());

        data.extend_from_slice(&0x4D0_u32.to_le_bytes()); // thread id
        data.extend_from_slice(&0x2_u32.to_le_bytes()); // WRITING_THREAD
        data.extend_from_slice(&0_u32.to_le_bytes()); // dump error
        data.extend_from_slice(&0_u32.to_le_bytes()); // exit status
        data.extend_from_slice(&0x01D8_0000_0000_0000_u64.to_le_bytes()); // create time
        data.extend_from_slice(&0_u64.to_le_bytes()); // exit time
        data.extend_from_slice(&1_000_000_u64.to_le_bytes()); // kernel time
        data.extend_from_slice(&2_000_000_u64.to_le_bytes()); // user time
        data.extend_from_slice(&0x0040_1000_u64.to_le_bytes()); // start address
        data.extend_from_slice(&0xF_u64.to_le_bytes()); // affinity

        let length = data.len() as u32;
        let source = Memory::new(data);
        let entries = decode(&source, &entry(length)).unwrap();

        assert_eq!(entries.len(), 1);
        let info = &entries[0];
        assert_eq!(info.thread_id, 0x4D0);
        assert!(info.dump_flags.contains(ThreadInfoFlags::WRITING_THREAD));
        assert_eq!(info.start_address, 0x0040_1000);
        assert_eq!(info.affinity, 0xF);
    }

    #[test]
    fn zero_length_is_empty() {
        let source = Memory::new(Vec::new());
        assert!(decode(&source, &entry(0)).unwrap().is_empty());
    }

    #[test]
    fn count_exceeds_stream() {
        let mut data = Vec::new();
        data.extend_from_slice(&(THREAD_INFO_HEADER_SIZE as u32).to_le_bytes());
        data.extend_from_slice(&(THREAD_INFO_RECORD_SIZE as u32).to_le_bytes());
        data.extend_from_slice(&3_u32.to_le_bytes()); // claims 3, carries 0

        let length = data.len() as u32;
        let source = Memory::new(data);
        let result = decode(&source, &entry(length));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
