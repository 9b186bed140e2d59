//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing minidump files from disk using
//! memory-mapped I/O. This approach provides efficient access to large dumps without
//! loading the entire content into memory upfront, while still allowing fast random
//! access to any part of the file.
//!
//! Minidumps of processes with large address spaces routinely reach hundreds of
//! megabytes (full-memory dumps reach gigabytes), and stream decoding touches them in
//! a non-sequential pattern: the directory at one end, stream payloads scattered
//! through the middle, out-of-line name strings wherever the writer placed them.
//! Demand paging handles that access pattern well.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dumpscope::file::{Backend, Physical};
//! use std::path::Path;
//!
//! let physical = Physical::new(Path::new("crash.dmp"))?;
//!
//! // Read the signature
//! let signature = physical.data_slice(0, 4)?;
//! assert_eq!(signature, b"MDMP");
//! # Ok::<(), dumpscope::Error>(())
//! ```

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// [`crate::file::Physical`] provides access to large dump files by mapping them
/// directly into the process's virtual address space. This eliminates the need to read
/// the entire file into memory upfront and allows the operating system to manage
/// memory efficiently through demand paging.
///
/// All access operations include bounds checking to ensure memory safety against
/// truncated or hostile input.
///
/// # Examples
///
/// ```rust,ignore
/// use dumpscope::file::{Backend, Physical};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("crash.dmp"))?;
/// println!("Dump size: {} bytes", physical.len());
/// # Ok::<(), dumpscope::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// This method opens the file at the given path and creates a memory mapping
    /// for it. The file is mapped as read-only and shared, allowing multiple
    /// processes to efficiently access the same file.
    ///
    /// # Arguments
    /// * `path` - Path to the dump file on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(crate::Error::OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(crate::Error::OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn physical() {
        let path = temp_file(
            "dumpscope_physical_basic.bin",
            &[0x4D, 0x44, 0x4D, 0x50, 0xAA, 0xBB, 0xCC, 0xDD],
        );

        let physical = Physical::new(&path).unwrap();

        assert_eq!(physical.len(), 8);
        assert_eq!(physical.data()[0], 0x4D);
        assert_eq!(physical.data_slice(0, 4).unwrap(), b"MDMP");
        assert_eq!(physical.data_slice(4, 4).unwrap(), &[0xAA, 0xBB, 0xCC, 0xDD]);

        if physical.data_slice(4, 5).is_ok() {
            panic!("This should not work!")
        }

        if physical
            .data_slice(u32::MAX as usize, u32::MAX as usize)
            .is_ok()
        {
            panic!("This should not work!")
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_physical_invalid_file_path() {
        let result = Physical::new("/nonexistent/path/to/file.dmp");
        assert!(result.is_err());
        match result.unwrap_err() {
            FileError(io_error) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn test_physical_empty_file() {
        let path = temp_file("dumpscope_physical_empty.bin", b"");

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.len(), 0);
        assert!(physical.is_empty());

        assert!(physical.data_slice(0, 1).is_err());
        assert!(physical.data_slice(1, 0).is_err());
        let empty_slice: &[u8] = &[];
        assert_eq!(physical.data_slice(0, 0).unwrap(), empty_slice);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_physical_boundary_conditions() {
        let path = temp_file("dumpscope_physical_bounds.bin", &[0u8; 64]);

        let physical = Physical::new(&path).unwrap();
        let len = physical.len();

        // Reading exactly at the boundary works
        assert_eq!(physical.data_slice(len - 1, 1).unwrap().len(), 1);
        assert_eq!(physical.data_slice(0, len).unwrap().len(), len);
        assert_eq!(physical.data_slice(len, 0).unwrap().len(), 0);

        // One past the boundary fails
        assert!(physical.data_slice(len, 1).is_err());
        assert!(physical.data_slice(len - 1, 2).is_err());
        assert!(physical.data_slice(usize::MAX, 1).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
