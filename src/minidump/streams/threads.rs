//! Thread list stream (`ThreadListStream`, type 3).
//!
//! A `u32` thread count followed by fixed 48-byte `MINIDUMP_THREAD` records. The stack
//! range and CPU context of each thread are stored out-of-line; this decoder surfaces
//! their locations without interpreting the context payload.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{
        directory::DirectoryEntry,
        streams::{memory::MemoryDescriptor, stream_slice, LocationDescriptor},
    },
    Result,
};

/// Size in bytes of one on-disk thread record.
pub const THREAD_RECORD_SIZE: usize = 48;

/// One captured thread of the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDescriptor {
    /// Thread id assigned by the operating system
    pub thread_id: u32,
    /// Suspend count at capture time
    pub suspend_count: u32,
    /// Scheduling priority class
    pub priority_class: u32,
    /// Scheduling priority within the class
    pub priority: u32,
    /// Address of the thread environment block in the target process
    pub teb: u64,
    /// Captured stack memory range
    pub stack: MemoryDescriptor,
    /// Location of the captured CPU context
    pub context: LocationDescriptor,
}

/// Decodes the thread list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared thread count does not match
/// the count computed from the stream length.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<ThreadDescriptor>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < 4 {
        return Err(stream_error!(
            "Thread list of {} bytes is shorter than its count field",
            data.len()
        ));
    }

    let mut offset = 0;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;
    let computed = (data.len() - 4) / THREAD_RECORD_SIZE;
    if declared != computed {
        return Err(stream_error!(
            "Thread count mismatch - declared {}, computed {}",
            declared,
            computed
        ));
    }

    let mut threads = Vec::with_capacity(declared);
    for _ in 0..declared {
        let thread_id = read_le_at::<u32>(data, &mut offset)?;
        let suspend_count = read_le_at::<u32>(data, &mut offset)?;
        let priority_class = read_le_at::<u32>(data, &mut offset)?;
        let priority = read_le_at::<u32>(data, &mut offset)?;
        let teb = read_le_at::<u64>(data, &mut offset)?;
        let stack = MemoryDescriptor::read(data, &mut offset)?;
        let context = LocationDescriptor::read(data, &mut offset)?;

        threads.push(ThreadDescriptor {
            thread_id,
            suspend_count,
            priority_class,
            priority,
            teb,
            stack,
            context,
        });
    }

    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    fn entry(length: u32) -> DirectoryEntry {
        DirectoryEntry {
            stream_type: crate::StreamType::ThreadList.raw(),
            length,
            rva: 0,
        }
    }

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x00, 0x00, 0x00,                         // 1 thread
            0xD0, 0x04, 0x00, 0x00,                         // thread id 0x4D0
            0x01, 0x00, 0x00, 0x00,                         // suspend count 1
            0x20, 0x00, 0x00, 0x00,                         // priority class
            0x02, 0x00, 0x00, 0x00,                         // priority
            0x00, 0x10, 0x00, 0x00, 0x7F, 0x00, 0x00, 0x00, // teb
            0x00, 0x00, 0xA0, 0x00, 0x00, 0x00, 0x00, 0x00, // stack start
            0x00, 0x40, 0x00, 0x00,                         // stack size
            0x00, 0x02, 0x00, 0x00,                         // stack rva
            0xCC, 0x02, 0x00, 0x00,                         // context size
            0x00, 0x06, 0x00, 0x00,                         // context rva
        ];

        let source = Memory::new(data);
        let threads = decode(&source, &entry(52)).unwrap();

        assert_eq!(threads.len(), 1);
        let thread = &threads[0];
        assert_eq!(thread.thread_id, 0x4D0);
        assert_eq!(thread.suspend_count, 1);
        assert_eq!(thread.teb, 0x7F_0000_1000);
        assert_eq!(thread.stack.start_of_memory_range, 0xA0_0000);
        assert_eq!(thread.stack.memory.data_size, 0x4000);
        assert_eq!(thread.context.data_size, 0x2CC);
        assert_eq!(thread.context.rva, 0x600);
    }

    #[test]
    fn zero_length_is_empty() {
        let source = Memory::new(Vec::new());
        assert!(decode(&source, &entry(0)).unwrap().is_empty());
    }

    #[test]
    fn zero_count_is_empty() {
        let source = Memory::new(vec![0x00, 0x00, 0x00, 0x00]);
        assert!(decode(&source, &entry(4)).unwrap().is_empty());
    }

    #[test]
    fn count_mismatch() {
        // Declares 3 threads but carries bytes for none
        let source = Memory::new(vec![0x03, 0x00, 0x00, 0x00]);
        let result = decode(&source, &entry(4));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
