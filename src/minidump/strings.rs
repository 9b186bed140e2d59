//! Out-of-line UTF-16 string records (`MINIDUMP_STRING`).
//!
//! Module names, thread names, handle type/object names, and the service-pack string are
//! not stored inline in their streams. Each is referenced by an RVA pointing at a
//! `MINIDUMP_STRING`: a 32-bit byte length followed by that many bytes of UTF-16LE text
//! (a terminating NUL follows but is not counted). This module resolves such references
//! against the full byte source with the same bounds paranoia as every other read.
//!
//! The buffer behind a memory mapping has no alignment guarantee at an arbitrary RVA, so
//! the UTF-16 units are assembled per-pair instead of reinterpreting the byte slice.

use crate::{file::Backend, Result};

use widestring::U16String;

/// Resolves a `MINIDUMP_STRING` at the given RVA into an owned `String`.
///
/// Unpaired surrogates are replaced rather than rejected; dump writers copy thread and
/// object names verbatim from the target process and make no validity promises.
///
/// # Arguments
/// * `source` - The container's byte source
/// * `rva` - File offset of the string record
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the record header or its declared buffer
/// does not resolve within the byte source, or if the declared byte length is odd.
pub(crate) fn read_string(source: &dyn Backend, rva: u32) -> Result<String> {
    let header = source.data_slice(rva as usize, 4).map_err(|_| {
        stream_error!("String record header at {:#x} is outside the file", rva)
    })?;
    let byte_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;

    if byte_len % 2 != 0 {
        return Err(stream_error!(
            "String record at {:#x} has odd byte length {}",
            rva,
            byte_len
        ));
    }

    let buffer = source
        .data_slice(rva as usize + 4, byte_len)
        .map_err(|_| {
            stream_error!(
                "String record buffer at {:#x} (+{} bytes) is outside the file",
                rva,
                byte_len
            )
        })?;

    let units: Vec<u16> = buffer
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(U16String::from_vec(units).to_string_lossy())
}

/// Resolves an optional `MINIDUMP_STRING` reference.
///
/// The format uses RVA 0 for "no string" (an absent handle object name, for example);
/// that maps to `None` rather than an empty string so callers can distinguish the two.
///
/// # Errors
/// Same as [`read_string`] for nonzero RVAs.
pub(crate) fn read_optional_string(source: &dyn Backend, rva: u32) -> Result<Option<String>> {
    if rva == 0 {
        return Ok(None);
    }

    read_string(source, rva).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = vec![
            0xFF, 0xFF, // leading junk so the record is not at offset 0
            0x0A, 0x00, 0x00, 0x00, // 10 bytes
            0x68, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00, // "hello"
            0x00, 0x00, // terminating NUL, not counted
        ];

        let source = Memory::new(data);
        assert_eq!(read_string(&source, 2).unwrap(), "hello");
    }

    #[test]
    fn crafted_empty() {
        let source = Memory::new(vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(read_string(&source, 0).unwrap(), "");
    }

    #[test]
    fn optional_zero_rva() {
        let source = Memory::new(vec![0u8; 4]);
        assert_eq!(read_optional_string(&source, 0).unwrap(), None);
    }

    #[test]
    fn header_out_of_bounds() {
        let source = Memory::new(vec![0u8; 4]);
        let result = read_string(&source, 2);
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }

    #[test]
    fn buffer_out_of_bounds() {
        // Declares 32 bytes of text but the file ends after 4
        let source = Memory::new(vec![0x20, 0x00, 0x00, 0x00, 0x41, 0x00, 0x42, 0x00]);
        let result = read_string(&source, 0);
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }

    #[test]
    fn odd_length_rejected() {
        let source = Memory::new(vec![0x03, 0x00, 0x00, 0x00, 0x41, 0x00, 0x42, 0x00]);
        let result = read_string(&source, 0);
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
