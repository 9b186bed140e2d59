//! Thread name assignments (`ThreadNamesStream`, type 24).
//!
//! A `u32` count followed by packed 12-byte records pairing a thread id with a 64-bit
//! RVA to an out-of-line UTF-16 string record. The RVA is 64 bits wide - the one place
//! the format anticipates names beyond 4 GiB - but must still resolve within the byte
//! source like every other embedded offset.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice, strings::read_string},
    Result,
};

/// Size in bytes of one packed on-disk name record.
pub const THREAD_NAME_RECORD_SIZE: usize = 12;

/// One thread id to name assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNameEntry {
    /// Thread id assigned by the operating system
    pub thread_id: u32,
    /// The thread's name, resolved from its out-of-line string record
    pub name: String,
}

/// Decodes the thread names stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared count does not match the
/// count computed from the stream length, or if a name RVA does not resolve within
/// the file.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<ThreadNameEntry>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < 4 {
        return Err(stream_error!(
            "Thread name list of {} bytes is shorter than its count field",
            data.len()
        ));
    }

    let mut offset = 0;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;
    let computed = (data.len() - 4) / THREAD_NAME_RECORD_SIZE;
    if declared != computed {
        return Err(stream_error!(
            "Thread name count mismatch - declared {}, computed {}",
            declared,
            computed
        ));
    }

    let mut names = Vec::with_capacity(declared);
    for _ in 0..declared {
        let thread_id = read_le_at::<u32>(data, &mut offset)?;
        let name_rva = read_le_at::<u64>(data, &mut offset)?;

        let Ok(name_rva) = u32::try_from(name_rva) else {
            return Err(stream_error!(
                "Thread name offset {:#x} exceeds the addressable file range",
                name_rva
            ));
        };

        names.push(ThreadNameEntry {
            thread_id,
            name: read_string(source, name_rva)?,
        });
    }

    Ok(names)
}
