//! Stream directory and catalog for minidump containers.
//!
//! The directory is an array of fixed 12-byte entries, each naming a stream type and the
//! location of its bytes within the container. This module reads the directory into a
//! [`StreamCatalog`], the in-memory index that resolves stream types to their locations
//! and enumerates what a container holds.
//!
//! The directory itself must lie fully inside the file or the open fails; an individual
//! entry pointing outside the file is kept in the catalog (so a shell can still show it)
//! but poisons only that stream's decode.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{header::Header, streamtype::StreamType},
    Result,
};

/// Size in bytes of one directory entry.
pub const DIRECTORY_ENTRY_SIZE: usize = 12;

/// One entry of the stream directory: a stream type id and the byte range of its data.
///
/// The raw type id is preserved even when this crate has no decoder for it; use
/// [`DirectoryEntry::kind`] to map it onto a known [`StreamType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Raw stream type id as stored in the directory
    pub stream_type: u32,
    /// Length in bytes of the stream's data
    pub length: u32,
    /// File offset of the stream's data
    pub rva: u32,
}

impl DirectoryEntry {
    /// Reads one directory entry at `offset`, advancing it past the entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 12 bytes remain.
    pub(crate) fn read(data: &[u8], offset: &mut usize) -> Result<DirectoryEntry> {
        let stream_type = read_le_at::<u32>(data, offset)?;
        let length = read_le_at::<u32>(data, offset)?;
        let rva = read_le_at::<u32>(data, offset)?;

        Ok(DirectoryEntry {
            stream_type,
            length,
            rva,
        })
    }

    /// Maps the raw stream type id onto a known [`StreamType`], if this crate has one.
    #[must_use]
    pub fn kind(&self) -> Option<StreamType> {
        StreamType::from_raw(self.stream_type)
    }

    /// Returns `true` if this entry's `[rva, rva + length)` range lies within a file of
    /// `total_len` bytes.
    #[must_use]
    pub fn range_within(&self, total_len: usize) -> bool {
        match u64::from(self.rva).checked_add(u64::from(self.length)) {
            Some(end) => end <= total_len as u64,
            None => false,
        }
    }
}

/// The in-memory index of a container's stream directory.
///
/// [`StreamCatalog`] holds every directory entry in file order and resolves known stream
/// types to their entries. Lookup on a type with no entry returns `None`, never an
/// error - absence is a normal state for many streams (a non-crash snapshot has no
/// exception stream, for example).
///
/// When a known stream type appears more than once, the first entry wins; later
/// duplicates stay visible through [`StreamCatalog::entries`] but are never decoded.
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::{Session, StreamType};
///
/// let session = Session::open("crash.dmp")?;
/// let catalog = session.catalog();
/// if let Some(entry) = catalog.lookup(StreamType::ModuleList) {
///     println!("module list: {} bytes at {:#x}", entry.length, entry.rva);
/// }
/// # Ok::<(), dumpscope::Error>(())
/// ```
#[derive(Debug)]
pub struct StreamCatalog {
    /// All directory entries in file order, including unknown types and duplicates
    entries: Vec<DirectoryEntry>,
}

impl StreamCatalog {
    /// Reads the stream directory described by `header` from the byte source.
    ///
    /// Only the directory array itself is read; no stream content is touched. The cost
    /// is O(stream count).
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the directory array does not fit inside
    /// the byte source. This is fatal to opening the container.
    pub(crate) fn read(source: &dyn Backend, header: &Header) -> Result<StreamCatalog> {
        let count = header.stream_count as usize;

        let Some(directory_len) = count.checked_mul(DIRECTORY_ENTRY_SIZE) else {
            return Err(truncated_error!(
                "Directory entry count causes overflow - {}",
                count
            ));
        };

        let directory = source
            .data_slice(header.directory_rva as usize, directory_len)
            .map_err(|_| {
                truncated_error!(
                    "Stream directory [{:#x}, +{}) exceeds file of {} bytes",
                    header.directory_rva,
                    directory_len,
                    source.len()
                )
            })?;

        let mut entries = Vec::with_capacity(count);
        let mut offset = 0;
        for _ in 0..count {
            entries.push(DirectoryEntry::read(directory, &mut offset)?);
        }

        Ok(StreamCatalog { entries })
    }

    /// Resolves a known stream type to its directory entry.
    ///
    /// Returns `None` when the container has no entry of that type - a legitimate,
    /// non-error state. When duplicates exist, the first entry in file order wins.
    #[must_use]
    pub fn lookup(&self, stream_type: StreamType) -> Option<DirectoryEntry> {
        let raw = stream_type.raw();
        self.entries
            .iter()
            .find(|entry| entry.stream_type == raw)
            .copied()
    }

    /// Returns all directory entries in file order, including entries whose type this
    /// crate cannot decode and duplicate entries.
    #[must_use]
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Returns the known stream types present in this container, in file order,
    /// without duplicates.
    ///
    /// This is the sequence a navigation shell iterates to know which nodes to show.
    #[must_use]
    pub fn stream_types(&self) -> Vec<StreamType> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if let Some(kind) = entry.kind() {
                if !seen.contains(&kind) {
                    seen.push(kind);
                }
            }
        }
        seen
    }

    /// Returns the number of directory entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the directory holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
