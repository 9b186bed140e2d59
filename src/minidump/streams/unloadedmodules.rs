//! Unloaded module list (`UnloadedModuleListStream`, type 14).
//!
//! A self-describing header (`SizeOfHeader`, `SizeOfEntry`, `u32` count) followed by
//! fixed 24-byte records describing modules that had been unloaded before the capture.
//! Names resolve out-of-line like loaded module names; unlike the loaded module list,
//! there is no version resource or debug record to carry.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice, strings::read_string},
    Result,
};

/// Size in bytes of the stream's own header.
pub const UNLOADED_MODULE_HEADER_SIZE: usize = 12;

/// Size in bytes of one on-disk unloaded module record.
pub const UNLOADED_MODULE_RECORD_SIZE: usize = 24;

/// One module that was unloaded before the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadedModuleDescriptor {
    /// Base address the image was loaded at
    pub base_of_image: u64,
    /// Size of the image in bytes
    pub size_of_image: u32,
    /// PE header checksum
    pub checksum: u32,
    /// PE header link timestamp
    pub time_date_stamp: u32,
    /// Path of the module, resolved from its out-of-line string record
    pub name: String,
}

/// Decodes the unloaded module list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the header sizes are smaller than the
/// known layouts, the declared entries do not fit in the stream, or a name RVA does
/// not resolve within the file.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<UnloadedModuleDescriptor>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < UNLOADED_MODULE_HEADER_SIZE {
        return Err(stream_error!(
            "Unloaded module stream of {} bytes is shorter than its header",
            data.len()
        ));
    }

    let mut offset = 0;
    let size_of_header = read_le_at::<u32>(data, &mut offset)? as usize;
    let size_of_entry = read_le_at::<u32>(data, &mut offset)? as usize;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;

    if size_of_header < UNLOADED_MODULE_HEADER_SIZE || size_of_header > data.len() {
        return Err(stream_error!(
            "Unloaded module header size {} is implausible for a {} byte stream",
            size_of_header,
            data.len()
        ));
    }
    if size_of_entry < UNLOADED_MODULE_RECORD_SIZE {
        return Err(stream_error!(
            "Unloaded module entry size {} is below the known layout",
            size_of_entry
        ));
    }

    let available = data.len() - size_of_header;
    let Some(table_len) = declared.checked_mul(size_of_entry) else {
        return Err(stream_error!(
            "Unloaded module count causes overflow - {}",
            declared
        ));
    };
    if table_len > available {
        return Err(stream_error!(
            "Unloaded module list declares {} entries but only {} bytes follow the header",
            declared,
            available
        ));
    }

    let mut modules = Vec::with_capacity(declared);
    for index in 0..declared {
        let mut offset = size_of_header + index * size_of_entry;

        let base_of_image = read_le_at::<u64>(data, &mut offset)?;
        let size_of_image = read_le_at::<u32>(data, &mut offset)?;
        let checksum = read_le_at::<u32>(data, &mut offset)?;
        let time_date_stamp = read_le_at::<u32>(data, &mut offset)?;
        let name_rva = read_le_at::<u32>(data, &mut offset)?;

        let name = if name_rva == 0 {
            String::new()
        } else {
            read_string(source, name_rva)?
        };

        modules.push(UnloadedModuleDescriptor {
            base_of_image,
            size_of_image,
            checksum,
            time_date_stamp,
            name,
        });
    }

    Ok(modules)
}
