//! Comment streams (`CommentStreamA`, type 10; `CommentStreamW`, type 11).
//!
//! Each comment stream is a single encoded string spanning the whole stream: ANSI bytes
//! for the A variant, UTF-16LE code units for the W variant. Writers usually include a
//! terminating NUL in the stream; decoding truncates at the first NUL so the trailing
//! terminator (and any slack after it) never leaks into the text.

use crate::{
    file::Backend,
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};

use widestring::U16Str;

/// Decodes an ANSI comment stream into text.
///
/// Bytes beyond the first NUL are ignored; non-ASCII bytes are replaced rather than
/// rejected since the original encoding depends on the writer's code page.
pub(crate) fn decode_ansi(source: &dyn Backend, entry: &DirectoryEntry) -> Result<String> {
    let data = stream_slice(source, entry)?;

    let text = match data.iter().position(|&byte| byte == 0) {
        Some(nul) => &data[..nul],
        None => data,
    };

    Ok(String::from_utf8_lossy(text).into_owned())
}

/// Decodes a UTF-16 comment stream into text.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the stream length is odd and therefore
/// cannot hold UTF-16 code units.
pub(crate) fn decode_wide(source: &dyn Backend, entry: &DirectoryEntry) -> Result<String> {
    let data = stream_slice(source, entry)?;

    if data.len() % 2 != 0 {
        return Err(stream_error!(
            "Wide comment stream has odd length {}",
            data.len()
        ));
    }

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let text = match units.iter().position(|&unit| unit == 0) {
        Some(nul) => &units[..nul],
        None => &units[..],
    };

    Ok(U16Str::from_slice(text).to_string_lossy())
}
