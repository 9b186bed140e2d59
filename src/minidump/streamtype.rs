//! Stream type identifiers for the minidump stream directory.
//!
//! Every directory entry carries a 32-bit stream type id. This module defines the
//! [`StreamType`] enum covering the stream types this crate can decode, along with
//! conversions from raw ids and the display names a navigation shell uses for labeling.
//! Ids without a variant here (reserved, vendor-defined, or newer than this crate)
//! remain visible through the catalog's raw entries but have no registered decoder.

use strum::{EnumCount, EnumIter};

/// Identifiers for the minidump stream types this crate decodes.
///
/// Each variant represents a specific typed block within the container. The numeric
/// values correspond to the `MINIDUMP_STREAM_TYPE` ids of the on-disk format.
///
/// ## Stream Categories
///
/// ### Execution state
/// - **`ThreadList`**: One record per thread with TEB, stack range, and context location
/// - **`ThreadInfoList`**: Extended per-thread accounting (times, start address, affinity)
/// - **`ThreadNames`**: Thread id to name mapping, names stored out-of-line
/// - **`Exception`**: The faulting exception record, when the dump captured a crash
///
/// ### Images
/// - **`ModuleList`**: Loaded modules with version resources and debug record locations
/// - **`UnloadedModuleList`**: Modules that had been unloaded before the capture
///
/// ### Memory
/// - **`MemoryList`**: Captured memory ranges with 32-bit location descriptors
/// - **`Memory64List`**: Compact full-memory range table with a single base offset
/// - **`MemoryInfoList`**: Virtual address space regions (state, protection, type)
///
/// ### System and process information
/// - **`SystemInfo`**: Processor architecture, OS version, CPU identification
/// - **`MiscInfo`**: Process id, times, and (newer revisions) processor power data
/// - **`SystemMemoryInfo`**: System-wide memory and performance counters
/// - **`HandleData`**: Open kernel handles with out-of-line type/object names
///
/// ### Annotations
/// - **`CommentA`**: ANSI comment text
/// - **`CommentW`**: UTF-16 comment text
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
#[repr(u32)]
pub enum StreamType {
    /// `ThreadListStream` (3) - Thread descriptors for every captured thread.
    ThreadList = 3,

    /// `ModuleListStream` (4) - Descriptors for every loaded module.
    ModuleList = 4,

    /// `MemoryListStream` (5) - Captured memory ranges with inline locations.
    MemoryList = 5,

    /// `ExceptionStream` (6) - The exception that triggered the capture, if any.
    Exception = 6,

    /// `SystemInfoStream` (7) - Processor and operating system identification.
    SystemInfo = 7,

    /// `Memory64ListStream` (9) - Full-memory range table addressed from a single base.
    Memory64List = 9,

    /// `CommentStreamA` (10) - ANSI comment text.
    CommentA = 10,

    /// `CommentStreamW` (11) - UTF-16 comment text.
    CommentW = 11,

    /// `HandleDataStream` (12) - Open kernel handle descriptors.
    HandleData = 12,

    /// `UnloadedModuleListStream` (14) - Modules unloaded before the capture.
    UnloadedModuleList = 14,

    /// `MiscInfoStream` (15) - Process identification, timing, and power data.
    MiscInfo = 15,

    /// `MemoryInfoListStream` (16) - Virtual address space region descriptions.
    MemoryInfoList = 16,

    /// `ThreadInfoListStream` (17) - Extended per-thread accounting records.
    ThreadInfoList = 17,

    /// `SystemMemoryInfoStream` (21) - System-wide memory and performance counters.
    SystemMemoryInfo = 21,

    /// `ThreadNamesStream` (24) - Thread id to name assignments.
    ThreadNames = 24,
}

impl StreamType {
    /// Converts a raw directory stream type id into a known [`StreamType`].
    ///
    /// Returns `None` for ids this crate has no decoder for (reserved ids, the unused
    /// id 0, and vendor-defined ranges). Such entries stay accessible as raw directory
    /// entries through [`crate::StreamCatalog::entries`].
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<StreamType> {
        match raw {
            3 => Some(StreamType::ThreadList),
            4 => Some(StreamType::ModuleList),
            5 => Some(StreamType::MemoryList),
            6 => Some(StreamType::Exception),
            7 => Some(StreamType::SystemInfo),
            9 => Some(StreamType::Memory64List),
            10 => Some(StreamType::CommentA),
            11 => Some(StreamType::CommentW),
            12 => Some(StreamType::HandleData),
            14 => Some(StreamType::UnloadedModuleList),
            15 => Some(StreamType::MiscInfo),
            16 => Some(StreamType::MemoryInfoList),
            17 => Some(StreamType::ThreadInfoList),
            21 => Some(StreamType::SystemMemoryInfo),
            24 => Some(StreamType::ThreadNames),
            _ => None,
        }
    }

    /// Returns the raw on-disk stream type id.
    #[must_use]
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Returns the display name a navigation shell uses to label this stream.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StreamType::ThreadList => "Threads",
            StreamType::ModuleList => "Modules",
            StreamType::MemoryList => "Memory",
            StreamType::Exception => "Exception",
            StreamType::SystemInfo => "SystemInfo",
            StreamType::Memory64List => "Memory64",
            StreamType::CommentA => "CommentA",
            StreamType::CommentW => "CommentW",
            StreamType::HandleData => "Handles",
            StreamType::UnloadedModuleList => "UnloadedModules",
            StreamType::MiscInfo => "MiscInfo",
            StreamType::MemoryInfoList => "MemoryInfo",
            StreamType::ThreadInfoList => "ThreadInfo",
            StreamType::SystemMemoryInfo => "SystemMemoryInfo",
            StreamType::ThreadNames => "ThreadNames",
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
