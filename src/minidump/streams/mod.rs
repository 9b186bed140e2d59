//! Stream decoders for every supported minidump stream type.
//!
//! Each submodule implements one pure decoding routine: `(byte source, directory entry)`
//! in, typed records out. Decoders never mutate state, never read other streams, and
//! bound every access - the single exception to locality being out-of-line string
//! records, which the format places outside the stream's own byte range by design.
//!
//! # Decoding rules
//!
//! - Fixed-size-record streams validate any embedded count field against the count
//!   computed from the entry length and fail with [`crate::Error::StreamDecode`] on
//!   mismatch.
//! - Variable-length streams resolve their embedded counts and offsets with checked
//!   arithmetic; an offset outside the byte source is a [`crate::Error::StreamDecode`].
//! - Singleton streams decode exactly one record.
//! - A zero-length entry for a list stream decodes to an empty sequence, not an error.
//!
//! # Dispatch
//!
//! Dispatch from a [`StreamType`] to its decoder is a data-driven registry: one table
//! row per stream type holding the display name, the decode function, and the cheap
//! summary-count function. Adding a stream type means adding a submodule and one
//! table row.

pub mod comment;
pub mod exception;
pub mod handles;
pub mod memory;
pub mod memory64;
pub mod memoryinfo;
pub mod miscinfo;
pub mod modules;
pub mod sysmeminfo;
pub mod systeminfo;
pub mod threadinfo;
pub mod threadnames;
pub mod threads;
pub mod unloadedmodules;

use crate::{
    file::{
        io::{read_le, read_le_at},
        Backend,
    },
    minidump::{directory::DirectoryEntry, streamtype::StreamType},
    Result,
};

pub use exception::{ExceptionDetail, ExceptionRecord};
pub use handles::HandleDescriptor;
pub use memory::MemoryDescriptor;
pub use memory64::{Memory64List, MemoryRange64};
pub use memoryinfo::{MemoryInfoEntry, MemoryProtection, MemoryRegionState, MemoryRegionType};
pub use miscinfo::{MiscInfo, MiscInfoFlags, ProcessorPowerInfo};
pub use modules::{FixedFileInfo, ModuleDescriptor};
pub use sysmeminfo::{
    SystemBasicInfo, SystemBasicPerfInfo, SystemFileCacheInfo, SystemMemoryInfo, SystemPerfInfo,
};
pub use systeminfo::{CpuInfo, SystemInfo};
pub use threadinfo::{ThreadInfoEntry, ThreadInfoFlags};
pub use threadnames::ThreadNameEntry;
pub use threads::ThreadDescriptor;
pub use unloadedmodules::UnloadedModuleDescriptor;

/// A location descriptor: the byte range of an out-of-line block within the container.
///
/// Thread contexts, module CodeView records, and captured memory contents are stored
/// this way - the stream holds only `(size, offset)` and the payload lives elsewhere in
/// the file. This crate surfaces the descriptor as-is; interpreting the payload (CPU
/// context layouts, symbol records) is outside its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationDescriptor {
    /// Size in bytes of the referenced block
    pub data_size: u32,
    /// File offset of the referenced block
    pub rva: u32,
}

impl LocationDescriptor {
    /// Reads a location descriptor at `offset`, advancing it by 8.
    pub(crate) fn read(data: &[u8], offset: &mut usize) -> Result<LocationDescriptor> {
        let data_size = read_le_at::<u32>(data, offset)?;
        let rva = read_le_at::<u32>(data, offset)?;

        Ok(LocationDescriptor { data_size, rva })
    }

    /// Returns `true` if no block is referenced (both fields zero).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_size == 0 && self.rva == 0
    }
}

/// One fully decoded stream, covering every record family this crate produces.
///
/// A [`DecodedStream`] is an immutable snapshot created once per stream by its decoder
/// and cached by the session; consumers receive it behind an `Arc` and render it however
/// they wish.
#[derive(Debug)]
pub enum DecodedStream {
    /// Decoded `ThreadListStream` records
    Threads(Vec<ThreadDescriptor>),
    /// Decoded `ModuleListStream` records
    Modules(Vec<ModuleDescriptor>),
    /// Decoded `MemoryListStream` records
    Memory(Vec<MemoryDescriptor>),
    /// Decoded `Memory64ListStream` range table
    Memory64(Memory64List),
    /// Decoded `MemoryInfoListStream` records
    MemoryInfo(Vec<MemoryInfoEntry>),
    /// Decoded `HandleDataStream` records
    Handles(Vec<HandleDescriptor>),
    /// Decoded `ThreadInfoListStream` records
    ThreadInfo(Vec<ThreadInfoEntry>),
    /// Decoded `ThreadNamesStream` records
    ThreadNames(Vec<ThreadNameEntry>),
    /// Decoded `UnloadedModuleListStream` records
    UnloadedModules(Vec<UnloadedModuleDescriptor>),
    /// Decoded `ExceptionStream` singleton
    Exception(ExceptionRecord),
    /// Decoded `SystemInfoStream` singleton
    SystemInfo(SystemInfo),
    /// Decoded `MiscInfoStream` singleton
    MiscInfo(MiscInfo),
    /// Decoded `SystemMemoryInfoStream` singleton
    SystemMemoryInfo(Box<SystemMemoryInfo>),
    /// Decoded `CommentStreamA` text
    CommentA(String),
    /// Decoded `CommentStreamW` text
    CommentW(String),
}

impl DecodedStream {
    /// Returns the number of items in this stream, as a shell would display it.
    ///
    /// List streams report their record count; singletons report 1; comments report
    /// 0 or 1 depending on emptiness.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            DecodedStream::Threads(items) => items.len(),
            DecodedStream::Modules(items) => items.len(),
            DecodedStream::Memory(items) => items.len(),
            DecodedStream::Memory64(list) => list.ranges.len(),
            DecodedStream::MemoryInfo(items) => items.len(),
            DecodedStream::Handles(items) => items.len(),
            DecodedStream::ThreadInfo(items) => items.len(),
            DecodedStream::ThreadNames(items) => items.len(),
            DecodedStream::UnloadedModules(items) => items.len(),
            DecodedStream::Exception(_)
            | DecodedStream::SystemInfo(_)
            | DecodedStream::MiscInfo(_)
            | DecodedStream::SystemMemoryInfo(_) => 1,
            DecodedStream::CommentA(text) | DecodedStream::CommentW(text) => {
                usize::from(!text.is_empty())
            }
        }
    }

    /// Returns `true` if this stream holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the thread records if this is a decoded thread list.
    #[must_use]
    pub fn as_threads(&self) -> Option<&[ThreadDescriptor]> {
        match self {
            DecodedStream::Threads(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the module records if this is a decoded module list.
    #[must_use]
    pub fn as_modules(&self) -> Option<&[ModuleDescriptor]> {
        match self {
            DecodedStream::Modules(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the memory records if this is a decoded memory list.
    #[must_use]
    pub fn as_memory(&self) -> Option<&[MemoryDescriptor]> {
        match self {
            DecodedStream::Memory(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the range table if this is a decoded full-memory list.
    #[must_use]
    pub fn as_memory64(&self) -> Option<&Memory64List> {
        match self {
            DecodedStream::Memory64(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the region records if this is a decoded memory info list.
    #[must_use]
    pub fn as_memory_info(&self) -> Option<&[MemoryInfoEntry]> {
        match self {
            DecodedStream::MemoryInfo(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the handle records if this is a decoded handle data stream.
    #[must_use]
    pub fn as_handles(&self) -> Option<&[HandleDescriptor]> {
        match self {
            DecodedStream::Handles(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the extended thread records if this is a decoded thread info list.
    #[must_use]
    pub fn as_thread_info(&self) -> Option<&[ThreadInfoEntry]> {
        match self {
            DecodedStream::ThreadInfo(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the name records if this is a decoded thread names stream.
    #[must_use]
    pub fn as_thread_names(&self) -> Option<&[ThreadNameEntry]> {
        match self {
            DecodedStream::ThreadNames(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the unloaded module records if this is a decoded unloaded module list.
    #[must_use]
    pub fn as_unloaded_modules(&self) -> Option<&[UnloadedModuleDescriptor]> {
        match self {
            DecodedStream::UnloadedModules(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the exception record if this is a decoded exception stream.
    #[must_use]
    pub fn as_exception(&self) -> Option<&ExceptionRecord> {
        match self {
            DecodedStream::Exception(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the system information if this is a decoded system info stream.
    #[must_use]
    pub fn as_system_info(&self) -> Option<&SystemInfo> {
        match self {
            DecodedStream::SystemInfo(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the process information if this is a decoded misc info stream.
    #[must_use]
    pub fn as_misc_info(&self) -> Option<&MiscInfo> {
        match self {
            DecodedStream::MiscInfo(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the system memory counters if this is a decoded system memory info stream.
    #[must_use]
    pub fn as_system_memory_info(&self) -> Option<&SystemMemoryInfo> {
        match self {
            DecodedStream::SystemMemoryInfo(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the comment text if this is a decoded comment stream (either encoding).
    #[must_use]
    pub fn as_comment(&self) -> Option<&str> {
        match self {
            DecodedStream::CommentA(text) | DecodedStream::CommentW(text) => Some(text),
            _ => None,
        }
    }
}

/// One registry row: how to label, decode, and cheaply size a stream type.
pub(crate) struct StreamDescriptor {
    /// Display name for shell labeling; identical to [`StreamType::name`]
    pub(crate) display_name: &'static str,
    /// The full decoder for this stream type
    pub(crate) decode: fn(&dyn Backend, &DirectoryEntry) -> Result<DecodedStream>,
    /// Cheap item count for the summary; reads at most the stream's header fields
    pub(crate) summary_count: fn(&dyn Backend, &DirectoryEntry) -> Result<u64>,
}

/// Resolves the registry row for a stream type.
///
/// Every [`StreamType`] variant has exactly one row; this is the single place that maps
/// stream types onto behavior.
pub(crate) fn descriptor(stream_type: StreamType) -> &'static StreamDescriptor {
    match stream_type {
        StreamType::ThreadList => &THREAD_LIST,
        StreamType::ModuleList => &MODULE_LIST,
        StreamType::MemoryList => &MEMORY_LIST,
        StreamType::Exception => &EXCEPTION,
        StreamType::SystemInfo => &SYSTEM_INFO,
        StreamType::Memory64List => &MEMORY64_LIST,
        StreamType::CommentA => &COMMENT_A,
        StreamType::CommentW => &COMMENT_W,
        StreamType::HandleData => &HANDLE_DATA,
        StreamType::UnloadedModuleList => &UNLOADED_MODULE_LIST,
        StreamType::MiscInfo => &MISC_INFO,
        StreamType::MemoryInfoList => &MEMORY_INFO_LIST,
        StreamType::ThreadInfoList => &THREAD_INFO_LIST,
        StreamType::SystemMemoryInfo => &SYSTEM_MEMORY_INFO,
        StreamType::ThreadNames => &THREAD_NAMES,
    }
}

static THREAD_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "Threads",
    decode: decode_threads,
    summary_count: count_prefixed_u32,
};

static MODULE_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "Modules",
    decode: decode_modules,
    summary_count: count_prefixed_u32,
};

static MEMORY_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "Memory",
    decode: decode_memory,
    summary_count: count_prefixed_u32,
};

static EXCEPTION: StreamDescriptor = StreamDescriptor {
    display_name: "Exception",
    decode: decode_exception,
    summary_count: count_singleton,
};

static SYSTEM_INFO: StreamDescriptor = StreamDescriptor {
    display_name: "SystemInfo",
    decode: decode_system_info,
    summary_count: count_singleton,
};

static MEMORY64_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "Memory64",
    decode: decode_memory64,
    summary_count: count_prefixed_u64,
};

static COMMENT_A: StreamDescriptor = StreamDescriptor {
    display_name: "CommentA",
    decode: decode_comment_a_stream,
    summary_count: count_comment_ansi,
};

static COMMENT_W: StreamDescriptor = StreamDescriptor {
    display_name: "CommentW",
    decode: decode_comment_w_stream,
    summary_count: count_comment_wide,
};

static HANDLE_DATA: StreamDescriptor = StreamDescriptor {
    display_name: "Handles",
    decode: decode_handles,
    summary_count: count_header_u32,
};

static UNLOADED_MODULE_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "UnloadedModules",
    decode: decode_unloaded_modules,
    summary_count: count_header_u32,
};

static MISC_INFO: StreamDescriptor = StreamDescriptor {
    display_name: "MiscInfo",
    decode: decode_misc_info,
    summary_count: count_singleton,
};

static MEMORY_INFO_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "MemoryInfo",
    decode: decode_memory_info,
    summary_count: count_header_u64,
};

static THREAD_INFO_LIST: StreamDescriptor = StreamDescriptor {
    display_name: "ThreadInfo",
    decode: decode_thread_info,
    summary_count: count_header_u32,
};

static SYSTEM_MEMORY_INFO: StreamDescriptor = StreamDescriptor {
    display_name: "SystemMemoryInfo",
    decode: decode_system_memory_info,
    summary_count: count_singleton,
};

static THREAD_NAMES: StreamDescriptor = StreamDescriptor {
    display_name: "ThreadNames",
    decode: decode_thread_names,
    summary_count: count_prefixed_u32,
};

fn decode_threads(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Threads(threads::decode(source, entry)?))
}

fn decode_modules(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Modules(modules::decode(source, entry)?))
}

fn decode_memory(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Memory(memory::decode(source, entry)?))
}

fn decode_exception(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Exception(exception::decode(source, entry)?))
}

fn decode_system_info(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::SystemInfo(systeminfo::decode(source, entry)?))
}

fn decode_memory64(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Memory64(memory64::decode(source, entry)?))
}

fn decode_comment_a_stream(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::CommentA(comment::decode_ansi(source, entry)?))
}

fn decode_comment_w_stream(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::CommentW(comment::decode_wide(source, entry)?))
}

fn decode_handles(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::Handles(handles::decode(source, entry)?))
}

fn decode_unloaded_modules(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<DecodedStream> {
    Ok(DecodedStream::UnloadedModules(unloadedmodules::decode(
        source, entry,
    )?))
}

fn decode_misc_info(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::MiscInfo(miscinfo::decode(source, entry)?))
}

fn decode_memory_info(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::MemoryInfo(memoryinfo::decode(source, entry)?))
}

fn decode_thread_info(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::ThreadInfo(threadinfo::decode(source, entry)?))
}

fn decode_system_memory_info(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<DecodedStream> {
    Ok(DecodedStream::SystemMemoryInfo(Box::new(sysmeminfo::decode(
        source, entry,
    )?)))
}

fn decode_thread_names(source: &dyn Backend, entry: &DirectoryEntry) -> Result<DecodedStream> {
    Ok(DecodedStream::ThreadNames(threadnames::decode(
        source, entry,
    )?))
}

/// Returns the slice of the byte source covered by a directory entry.
///
/// # Errors
/// Returns [`crate::Error::Truncated`] if the entry's range exceeds the file bounds.
/// This is the entry-level truncation case - scoped to the stream, never fatal to the
/// session.
pub(crate) fn stream_slice<'a>(
    source: &'a dyn Backend,
    entry: &DirectoryEntry,
) -> Result<&'a [u8]> {
    source
        .data_slice(entry.rva as usize, entry.length as usize)
        .map_err(|_| {
            truncated_error!(
                "Stream range [{:#x}, +{}) exceeds file of {} bytes",
                entry.rva,
                entry.length,
                source.len()
            )
        })
}

fn count_singleton(_source: &dyn Backend, _entry: &DirectoryEntry) -> Result<u64> {
    Ok(1)
}

/// Declared count stored as the stream's first u32 (thread, module, memory,
/// thread-name lists).
fn count_prefixed_u32(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length == 0 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    Ok(u64::from(read_le::<u32>(data)?))
}

/// Declared count stored as the stream's first u64 (the 64-bit memory list).
fn count_prefixed_u64(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length == 0 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    read_le::<u64>(data)
}

/// Declared count stored as a u32 at offset 8, after the two header size fields
/// (handle data, unloaded modules, thread info).
fn count_header_u32(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length == 0 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    let mut offset = 8;
    Ok(u64::from(read_le_at::<u32>(data, &mut offset)?))
}

/// Declared count stored as a u64 at offset 8 (memory info list).
fn count_header_u64(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length == 0 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    let mut offset = 8;
    read_le_at::<u64>(data, &mut offset)
}

fn count_comment_ansi(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length == 0 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    Ok(u64::from(data[0] != 0))
}

fn count_comment_wide(source: &dyn Backend, entry: &DirectoryEntry) -> Result<u64> {
    if entry.length < 2 {
        return Ok(0);
    }

    let data = stream_slice(source, entry)?;
    Ok(u64::from(read_le::<u16>(data)? != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;
    use strum::IntoEnumIterator;

    #[test]
    fn every_stream_type_has_a_descriptor() {
        for ty in StreamType::iter() {
            let descriptor = descriptor(ty);
            assert_eq!(descriptor.display_name, ty.name());
        }
    }

    #[test]
    fn singleton_counts() {
        let source = Memory::new(Vec::new());
        let entry = DirectoryEntry {
            stream_type: StreamType::SystemInfo.raw(),
            length: 0,
            rva: 0,
        };
        assert_eq!(count_singleton(&source, &entry).unwrap(), 1);
    }

    #[test]
    fn prefixed_counts_on_empty_entries() {
        let source = Memory::new(Vec::new());
        let entry = DirectoryEntry {
            stream_type: StreamType::ThreadList.raw(),
            length: 0,
            rva: 0,
        };
        assert_eq!(count_prefixed_u32(&source, &entry).unwrap(), 0);
        assert_eq!(count_prefixed_u64(&source, &entry).unwrap(), 0);
        assert_eq!(count_header_u32(&source, &entry).unwrap(), 0);
        assert_eq!(count_header_u64(&source, &entry).unwrap(), 0);
    }

    #[test]
    fn comment_counts() {
        let source = Memory::new(vec![0x41, 0x00, 0x42, 0x00]);

        let wide = DirectoryEntry {
            stream_type: StreamType::CommentW.raw(),
            length: 4,
            rva: 0,
        };
        assert_eq!(count_comment_wide(&source, &wide).unwrap(), 1);

        let nul_only = Memory::new(vec![0x00, 0x00]);
        let wide_empty = DirectoryEntry {
            stream_type: StreamType::CommentW.raw(),
            length: 2,
            rva: 0,
        };
        assert_eq!(count_comment_wide(&nul_only, &wide_empty).unwrap(), 0);

        let ansi = DirectoryEntry {
            stream_type: StreamType::CommentA.raw(),
            length: 4,
            rva: 0,
        };
        assert_eq!(count_comment_ansi(&source, &ansi).unwrap(), 1);
    }
}
