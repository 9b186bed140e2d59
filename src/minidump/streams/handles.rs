//! Open handle table (`HandleDataStream`, type 12).
//!
//! A self-describing header (`SizeOfHeader`, `SizeOfDescriptor`, `u32` count, reserved)
//! followed by handle descriptors. Two descriptor revisions exist: the original 32-byte
//! layout and a 40-byte revision that appends an object-information RVA. The header's
//! descriptor size decides which one a dump carries; anything larger decodes its known
//! prefix. Type and object names are stored out-of-line, with RVA 0 meaning "no name".

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice, strings::read_optional_string},
    Result,
};

/// Size in bytes of the stream's own header.
pub const HANDLE_HEADER_SIZE: usize = 16;

/// Size in bytes of the original handle descriptor revision.
pub const HANDLE_DESCRIPTOR_SIZE: usize = 32;

/// Size in bytes of the second handle descriptor revision.
pub const HANDLE_DESCRIPTOR_2_SIZE: usize = 40;

/// One open kernel handle of the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleDescriptor {
    /// The handle value
    pub handle: u64,
    /// Kernel object type name ("File", "Mutant", ...), when captured
    pub type_name: Option<String>,
    /// Name of the underlying object, when captured and named
    pub object_name: Option<String>,
    /// Handle attribute flags
    pub attributes: u32,
    /// Access mask the handle was granted
    pub granted_access: u32,
    /// Number of open handles to the object
    pub handle_count: u32,
    /// Number of kernel references to the object
    pub pointer_count: u32,
    /// Location of per-type object information, second-revision dumps only
    pub object_info_rva: Option<u32>,
}

/// Decodes the handle data stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the header sizes are smaller than the
/// known layouts, the declared descriptors do not fit in the stream, or a name RVA does
/// not resolve within the file.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<HandleDescriptor>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < HANDLE_HEADER_SIZE {
        return Err(stream_error!(
            "Handle data stream of {} bytes is shorter than its header",
            data.len()
        ));
    }

    let mut offset = 0;
    let size_of_header = read_le_at::<u32>(data, &mut offset)? as usize;
    let size_of_descriptor = read_le_at::<u32>(data, &mut offset)? as usize;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;

    if size_of_header < HANDLE_HEADER_SIZE || size_of_header > data.len() {
        return Err(stream_error!(
            "Handle data header size {} is implausible for a {} byte stream",
            size_of_header,
            data.len()
        ));
    }
    if size_of_descriptor < HANDLE_DESCRIPTOR_SIZE {
        return Err(stream_error!(
            "Handle descriptor size {} is below the known layout",
            size_of_descriptor
        ));
    }

    let available = data.len() - size_of_header;
    let Some(table_len) = declared.checked_mul(size_of_descriptor) else {
        return Err(stream_error!(
            "Handle descriptor count causes overflow - {}",
            declared
        ));
    };
    if table_len > available {
        return Err(stream_error!(
            "Handle data declares {} descriptors but only {} bytes follow the header",
            declared,
            available
        ));
    }

    let second_revision = size_of_descriptor >= HANDLE_DESCRIPTOR_2_SIZE;

    let mut handles = Vec::with_capacity(declared);
    for index in 0..declared {
        let mut offset = size_of_header + index * size_of_descriptor;

        let handle = read_le_at::<u64>(data, &mut offset)?;
        let type_name_rva = read_le_at::<u32>(data, &mut offset)?;
        let object_name_rva = read_le_at::<u32>(data, &mut offset)?;
        let attributes = read_le_at::<u32>(data, &mut offset)?;
        let granted_access = read_le_at::<u32>(data, &mut offset)?;
        let handle_count = read_le_at::<u32>(data, &mut offset)?;
        let pointer_count = read_le_at::<u32>(data, &mut offset)?;

        let object_info_rva = if second_revision {
            let rva = read_le_at::<u32>(data, &mut offset)?;
            (rva != 0).then_some(rva)
        } else {
            None
        };

        handles.push(HandleDescriptor {
            handle,
            type_name: read_optional_string(source, type_name_rva)?,
            object_name: read_optional_string(source, object_name_rva)?,
            attributes,
            granted_access,
            handle_count,
            pointer_count,
            object_info_rva,
        });
    }

    Ok(handles)
}
