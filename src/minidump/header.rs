//! Container header for minidump files.
//!
//! This module defines the [`Header`] struct, the fixed 32-byte structure at the start of
//! every minidump. It carries the `MDMP` signature, the format version word, and the
//! location of the stream directory, and it is the only structure whose validation is
//! fatal to opening a container.
//!
//! # Example
//!
//! ```rust,no_run
//! use dumpscope::Header;
//! let header = Header::read(&[
//!     0x4D, 0x44, 0x4D, 0x50, // "MDMP"
//!     0x93, 0xA7, 0x00, 0x00, // version
//!     0x02, 0x00, 0x00, 0x00, // 2 streams
//!     0x20, 0x00, 0x00, 0x00, // directory at offset 32
//!     0x00, 0x00, 0x00, 0x00, // checksum
//!     0x00, 0x00, 0x00, 0x00, // timestamp
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // flags
//! ])?;
//! assert_eq!(header.stream_count, 2);
//! # Ok::<(), dumpscope::Error>(())
//! ```

use crate::{
    file::io::{read_le, read_le_at},
    Result,
};
use bitflags::bitflags;

/// The MAGIC value at the start of every minidump: "MDMP" in little-endian.
pub const DUMP_HEADER_MAGIC: u32 = 0x504D_444D;

/// The implementation version carried in the low word of the header's version field.
///
/// The high word holds an internal writer build number and varies between producers,
/// so only the low word takes part in validation.
pub const DUMP_HEADER_VERSION: u32 = 0xA793;

/// Size in bytes of the fixed container header.
pub const DUMP_HEADER_SIZE: usize = 32;

bitflags! {
    /// Capture-type flags from the container header (`MINIDUMP_TYPE`).
    ///
    /// These record what the writer chose to include in the dump. They are advisory
    /// for a reader: stream presence is still determined solely by the directory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DumpFlags: u64 {
        /// Capture includes data sections of loaded modules
        const WITH_DATA_SEGS = 0x0000_0001;
        /// Capture includes all accessible process memory
        const WITH_FULL_MEMORY = 0x0000_0002;
        /// Capture includes the handle table
        const WITH_HANDLE_DATA = 0x0000_0004;
        /// Stack and backing store memory was filtered
        const FILTER_MEMORY = 0x0000_0008;
        /// Stack and backing store memory was scanned for module references
        const SCAN_MEMORY = 0x0000_0010;
        /// Capture includes the unloaded module list
        const WITH_UNLOADED_MODULES = 0x0000_0020;
        /// Capture includes pages referenced by locals or other stack memory
        const WITH_INDIRECTLY_REFERENCED_MEMORY = 0x0000_0040;
        /// Module paths were stripped to file names only
        const FILTER_MODULE_PATHS = 0x0000_0080;
        /// Capture includes process and thread environment blocks
        const WITH_PROCESS_THREAD_DATA = 0x0000_0100;
        /// Capture includes private read/write memory pages
        const WITH_PRIVATE_READ_WRITE_MEMORY = 0x0000_0200;
        /// Optional per-module data was elided
        const WITHOUT_OPTIONAL_DATA = 0x0000_0400;
        /// Capture includes the full memory region list
        const WITH_FULL_MEMORY_INFO = 0x0000_0800;
        /// Capture includes extended per-thread information
        const WITH_THREAD_INFO = 0x0000_1000;
        /// Capture includes code sections of loaded modules
        const WITH_CODE_SEGS = 0x0000_2000;
        /// Auxiliary-provider state was not collected
        const WITHOUT_AUXILIARY_STATE = 0x0000_4000;
        /// All auxiliary-provider state was collected
        const WITH_FULL_AUXILIARY_STATE = 0x0000_8000;
        /// Capture includes private write-copy memory pages
        const WITH_PRIVATE_WRITE_COPY_MEMORY = 0x0001_0000;
        /// Inaccessible memory was skipped instead of failing the capture
        const IGNORE_INACCESSIBLE_MEMORY = 0x0002_0000;
        /// Capture includes security token information
        const WITH_TOKEN_INFORMATION = 0x0004_0000;
        /// Capture includes module header pages
        const WITH_MODULE_HEADERS = 0x0008_0000;
        /// Capture was filtered for triage
        const FILTER_TRIAGE = 0x0010_0000;
    }
}

/// The fixed header of a minidump container.
///
/// [`Header`] gives access to the validated signature and version, the stream count,
/// the stream directory location, and the capture flags. It is the first structure
/// parsed when opening a container; a signature or version mismatch fails the open
/// with [`crate::Error::Format`] and no session is created.
///
/// # Example
///
/// ```rust,no_run
/// use dumpscope::Header;
/// let header = Header::read(&[
///     0x4D, 0x44, 0x4D, 0x50,
///     0x93, 0xA7, 0x00, 0x00,
///     0x01, 0x00, 0x00, 0x00,
///     0x20, 0x00, 0x00, 0x00,
///     0x00, 0x00, 0x00, 0x00,
///     0x78, 0x56, 0x34, 0x12,
///     0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
/// ])?;
/// assert_eq!(header.time_date_stamp, 0x1234_5678);
/// # Ok::<(), dumpscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Header {
    /// Magic signature: 0x504D444D ("MDMP")
    pub signature: u32,
    /// Full version field; low word is the format version, high word a writer build number
    pub version: u32,
    /// Number of entries in the stream directory
    pub stream_count: u32,
    /// File offset of the stream directory array
    pub directory_rva: u32,
    /// Optional checksum over the file, 0 when not computed
    pub checksum: u32,
    /// Capture time as a time_t value
    pub time_date_stamp: u32,
    /// Capture-type flags describing what the writer included
    pub flags: DumpFlags,
}

impl Header {
    /// Reads and validates a [`Header`] from the start of the container bytes.
    ///
    /// # Arguments
    /// * `data` - The byte slice from which this object shall be read
    ///
    /// # Errors
    /// Returns [`crate::Error::Format`] if the signature or version word does not match
    /// the minidump constants, or [`crate::Error::OutOfBounds`] if fewer than 32 bytes
    /// are available.
    pub fn read(data: &[u8]) -> Result<Header> {
        if data.len() < DUMP_HEADER_SIZE {
            return Err(crate::Error::OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != DUMP_HEADER_MAGIC {
            return Err(format_error!(
                "DUMP_HEADER_MAGIC does not match - {:#010X}",
                signature
            ));
        }

        let version = read_le::<u32>(&data[4..])?;
        if version & 0xFFFF != DUMP_HEADER_VERSION {
            return Err(format_error!(
                "Unsupported minidump version - {:#06X}",
                version & 0xFFFF
            ));
        }

        let mut offset = 8;
        let stream_count = read_le_at::<u32>(data, &mut offset)?;
        let directory_rva = read_le_at::<u32>(data, &mut offset)?;
        let checksum = read_le_at::<u32>(data, &mut offset)?;
        let time_date_stamp = read_le_at::<u32>(data, &mut offset)?;
        let flags = DumpFlags::from_bits_retain(read_le_at::<u64>(data, &mut offset)?);

        Ok(Header {
            signature,
            version,
            stream_count,
            directory_rva,
            checksum,
            time_date_stamp,
            flags,
        })
    }
}
