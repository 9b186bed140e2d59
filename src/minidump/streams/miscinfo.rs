//! Process information (`MiscInfoStream`, type 15).
//!
//! A singleton, self-sizing record: `SizeOfInfo` declares which revision the writer
//! produced. The original 24-byte revision carries the process id and times; the
//! 44-byte second revision appends processor power data. Larger revisions exist and
//! decode their known prefix. The `Flags1` word gates which fields actually hold
//! valid data, independently of which revision carried them.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};
use bitflags::bitflags;

/// Size in bytes of the original misc info revision.
pub const MISC_INFO_SIZE: usize = 24;

/// Size in bytes of the second misc info revision.
pub const MISC_INFO_2_SIZE: usize = 44;

bitflags! {
    /// Validity flags for the misc info fields (`MINIDUMP_MISC1_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MiscInfoFlags: u32 {
        /// `process_id` holds valid data
        const PROCESS_ID = 0x0000_0001;
        /// The process time fields hold valid data
        const PROCESS_TIMES = 0x0000_0002;
        /// The processor power fields hold valid data
        const PROCESSOR_POWER_INFO = 0x0000_0004;
    }
}

/// Processor power data carried by the second misc info revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorPowerInfo {
    /// Maximum processor frequency in MHz
    pub processor_max_mhz: u32,
    /// Current processor frequency in MHz
    pub processor_current_mhz: u32,
    /// Frequency limit imposed by power management in MHz
    pub processor_mhz_limit: u32,
    /// Deepest supported idle state
    pub processor_max_idle_state: u32,
    /// Current idle state
    pub processor_current_idle_state: u32,
}

/// The decoded misc info stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiscInfo {
    /// Declared size of the record; identifies the writer's revision
    pub size_of_info: u32,
    /// Which fields hold valid data
    pub flags: MiscInfoFlags,
    /// Process id, valid when [`MiscInfoFlags::PROCESS_ID`] is set
    pub process_id: u32,
    /// Process creation time as a time_t value
    pub process_create_time: u32,
    /// Cumulative user-mode time in seconds
    pub process_user_time: u32,
    /// Cumulative kernel-mode time in seconds
    pub process_kernel_time: u32,
    /// Processor power data, second-revision dumps only
    pub power_info: Option<ProcessorPowerInfo>,
}

/// Decodes the misc info stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared size is below the original
/// revision, exceeds the stream length, or the stream is shorter than its declaration.
pub(crate) fn decode(source: &dyn Backend, entry: &DirectoryEntry) -> Result<MiscInfo> {
    let data = stream_slice(source, entry)?;

    if data.len() < MISC_INFO_SIZE {
        return Err(stream_error!(
            "Misc info stream of {} bytes is shorter than the {} byte record",
            data.len(),
            MISC_INFO_SIZE
        ));
    }

    let mut offset = 0;
    let size_of_info = read_le_at::<u32>(data, &mut offset)?;
    if (size_of_info as usize) < MISC_INFO_SIZE || size_of_info as usize > data.len() {
        return Err(stream_error!(
            "Misc info declares {} bytes in a {} byte stream",
            size_of_info,
            data.len()
        ));
    }

    let flags = MiscInfoFlags::from_bits_retain(read_le_at::<u32>(data, &mut offset)?);
    let process_id = read_le_at::<u32>(data, &mut offset)?;
    let process_create_time = read_le_at::<u32>(data, &mut offset)?;
    let process_user_time = read_le_at::<u32>(data, &mut offset)?;
    let process_kernel_time = read_le_at::<u32>(data, &mut offset)?;

    let power_info = if size_of_info as usize >= MISC_INFO_2_SIZE {
        Some(ProcessorPowerInfo {
            processor_max_mhz: read_le_at::<u32>(data, &mut offset)?,
            processor_current_mhz: read_le_at::<u32>(data, &mut offset)?,
            processor_mhz_limit: read_le_at::<u32>(data, &mut offset)?,
            processor_max_idle_state: read_le_at::<u32>(data, &mut offset)?,
            processor_current_idle_state: read_le_at::<u32>(data, &mut offset)?,
        })
    } else {
        None
    };

    Ok(MiscInfo {
        size_of_info,
        flags,
        process_id,
        process_create_time,
        process_user_time,
        process_kernel_time,
        power_info,
    })
}
