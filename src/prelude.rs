//! # dumpscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dumpscope library. Import this module to get quick access to the essential
//! types for minidump inspection.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dumpscope operations
pub use crate::Error;

/// The result type used throughout dumpscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The open minidump container with decode-on-demand stream access
pub use crate::Session;

/// The cheap container overview
pub use crate::{Summary, SummaryEntry};

// ================================================================================================
// Container Structure
// ================================================================================================

/// The validated container header and its capture flags
pub use crate::{DumpFlags, Header};

/// The stream directory index and its entries
pub use crate::{DirectoryEntry, StreamCatalog};

/// Known stream type ids
pub use crate::StreamType;

/// Extension hint helpers for file pickers
pub use crate::{is_recognized_extension, DUMP_FILE_EXTENSIONS};

// ================================================================================================
// Decoded Streams and Records
// ================================================================================================

/// One decoded stream of any record family
pub use crate::DecodedStream;

/// Record types, one family per stream type
pub use crate::minidump::streams::{
    CpuInfo, ExceptionDetail, ExceptionRecord, FixedFileInfo, HandleDescriptor,
    LocationDescriptor, Memory64List, MemoryDescriptor, MemoryInfoEntry, MemoryProtection,
    MemoryRange64, MemoryRegionState, MemoryRegionType, MiscInfo, MiscInfoFlags,
    ModuleDescriptor, ProcessorPowerInfo, SystemInfo, SystemMemoryInfo, ThreadDescriptor,
    ThreadInfoEntry, ThreadInfoFlags, ThreadNameEntry, UnloadedModuleDescriptor,
};

// ================================================================================================
// Byte Sources
// ================================================================================================

/// Byte source abstraction for containers on disk or in memory
pub use crate::file::{Backend, Memory, Physical};
