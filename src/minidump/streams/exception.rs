//! Exception stream (`ExceptionStream`, type 6).
//!
//! A singleton 168-byte record present only in dumps that captured a crash: the faulting
//! thread id, the exception record (code, flags, address, up to 15 parameter words), and
//! the location of the faulting thread's CPU context. A snapshot taken without a crash
//! simply has no entry of this type.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{
        directory::DirectoryEntry,
        streams::{stream_slice, LocationDescriptor},
    },
    Result,
};

/// Size in bytes of the on-disk exception stream.
pub const EXCEPTION_STREAM_SIZE: usize = 168;

/// Maximum number of exception parameter words the format carries.
pub const EXCEPTION_MAXIMUM_PARAMETERS: usize = 15;

/// The exception itself: what was raised, where, and with which parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionDetail {
    /// Exception code (0xC0000005 for an access violation, ...)
    pub exception_code: u32,
    /// Exception flags; 1 marks a non-continuable exception
    pub exception_flags: u32,
    /// Address of a chained exception record in the target process, 0 if none
    pub exception_record: u64,
    /// Faulting instruction address
    pub exception_address: u64,
    /// Exception parameters, truncated to the declared parameter count
    pub exception_information: Vec<u64>,
}

/// The decoded exception stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    /// Id of the faulting thread
    pub thread_id: u32,
    /// The exception record
    pub exception: ExceptionDetail,
    /// Location of the faulting thread's captured CPU context
    pub thread_context: LocationDescriptor,
}

/// Decodes the exception stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the stream is shorter than the fixed
/// record or declares more parameters than the format allows.
pub(crate) fn decode(source: &dyn Backend, entry: &DirectoryEntry) -> Result<ExceptionRecord> {
    let data = stream_slice(source, entry)?;
    if data.len() < EXCEPTION_STREAM_SIZE {
        return Err(stream_error!(
            "Exception stream of {} bytes is shorter than the {} byte record",
            data.len(),
            EXCEPTION_STREAM_SIZE
        ));
    }

    let mut offset = 0;
    let thread_id = read_le_at::<u32>(data, &mut offset)?;
    offset += 4; // alignment

    let exception_code = read_le_at::<u32>(data, &mut offset)?;
    let exception_flags = read_le_at::<u32>(data, &mut offset)?;
    let exception_record = read_le_at::<u64>(data, &mut offset)?;
    let exception_address = read_le_at::<u64>(data, &mut offset)?;
    let number_parameters = read_le_at::<u32>(data, &mut offset)? as usize;
    offset += 4; // alignment

    if number_parameters > EXCEPTION_MAXIMUM_PARAMETERS {
        return Err(stream_error!(
            "Exception declares {} parameters, format maximum is {}",
            number_parameters,
            EXCEPTION_MAXIMUM_PARAMETERS
        ));
    }

    let mut exception_information = Vec::with_capacity(number_parameters);
    for _ in 0..number_parameters {
        exception_information.push(read_le_at::<u64>(data, &mut offset)?);
    }
    offset += (EXCEPTION_MAXIMUM_PARAMETERS - number_parameters) * 8;

    let thread_context = LocationDescriptor::read(data, &mut offset)?;

    Ok(ExceptionRecord {
        thread_id,
        exception: ExceptionDetail {
            exception_code,
            exception_flags,
            exception_record,
            exception_address,
            exception_information,
        },
        thread_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    fn entry(length: u32) -> DirectoryEntry {
        DirectoryEntry {
            stream_type: crate::StreamType::Exception.raw(),
            length,
            rva: 0,
        }
    }

    fn crafted_stream(number_parameters: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(EXCEPTION_STREAM_SIZE);
        data.extend_from_slice(&0x4D0_u32.to_le_bytes()); // thread id
        data.extend_from_slice(&[0u8; 4]); // alignment
        data.extend_from_slice(&0xC000_0005_u32.to_le_bytes()); // access violation
        data.extend_from_slice(&1_u32.to_le_bytes()); // non-continuable
        data.extend_from_slice(&0_u64.to_le_bytes()); // no chained record
        data.extend_from_slice(&0x7FF6_1000_2030_u64.to_le_bytes()); // address
        data.extend_from_slice(&number_parameters.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]); // alignment
        data.extend_from_slice(&1_u64.to_le_bytes()); // write access
        data.extend_from_slice(&0xDEAD_BEEF_u64.to_le_bytes()); // faulting address
        data.extend_from_slice(&[0u8; 13 * 8]); // unused parameter slots
        data.extend_from_slice(&0x4D0_u32.to_le_bytes()); // context size
        data.extend_from_slice(&0x2000_u32.to_le_bytes()); // context rva
        assert_eq!(data.len(), EXCEPTION_STREAM_SIZE);
        data
    }

    #[test]
    fn crafted() {
        let source = Memory::new(crafted_stream(2));
        let record = decode(&source, &entry(EXCEPTION_STREAM_SIZE as u32)).unwrap();

        assert_eq!(record.thread_id, 0x4D0);
        assert_eq!(record.exception.exception_code, 0xC000_0005);
        assert_eq!(record.exception.exception_flags, 1);
        assert_eq!(record.exception.exception_address, 0x7FF6_1000_2030);
        assert_eq!(record.exception.exception_information, vec![1, 0xDEAD_BEEF]);
        assert_eq!(record.thread_context.data_size, 0x4D0);
        assert_eq!(record.thread_context.rva, 0x2000);
    }

    #[test]
    fn too_short() {
        let source = Memory::new(vec![0u8; 64]);
        let result = decode(&source, &entry(64));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }

    #[test]
    fn too_many_parameters() {
        let source = Memory::new(crafted_stream(16));
        let result = decode(&source, &entry(EXCEPTION_STREAM_SIZE as u32));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
