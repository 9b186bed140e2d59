//! Module list stream (`ModuleListStream`, type 4).
//!
//! A `u32` module count followed by fixed 108-byte `MINIDUMP_MODULE` records. Each
//! record embeds a 52-byte `VS_FIXEDFILEINFO` version resource and references its path
//! name out-of-line via an RVA to a UTF-16 string record.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{
        directory::DirectoryEntry,
        streams::{stream_slice, LocationDescriptor},
        strings::read_string,
    },
    Result,
};

/// Size in bytes of one on-disk module record.
pub const MODULE_RECORD_SIZE: usize = 108;

/// The fixed portion of a module's version resource (`VS_FIXEDFILEINFO`).
///
/// File and product versions are stored as two 32-bit halves each; the conventional
/// rendering is `HIWORD(ms).LOWORD(ms).HIWORD(ls).LOWORD(ls)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedFileInfo {
    /// Structure signature, 0xFEEF04BD when the resource is present
    pub signature: u32,
    /// Binary version of the structure itself
    pub struct_version: u32,
    /// Most significant half of the file version
    pub file_version_ms: u32,
    /// Least significant half of the file version
    pub file_version_ls: u32,
    /// Most significant half of the product version
    pub product_version_ms: u32,
    /// Least significant half of the product version
    pub product_version_ls: u32,
    /// Mask of valid bits in `file_flags`
    pub file_flags_mask: u32,
    /// Build attribute flags (debug, prerelease, patched, ...)
    pub file_flags: u32,
    /// Target operating system family
    pub file_os: u32,
    /// General file type (application, DLL, driver, ...)
    pub file_type: u32,
    /// Subtype within `file_type`
    pub file_subtype: u32,
    /// Most significant half of the build timestamp
    pub file_date_ms: u32,
    /// Least significant half of the build timestamp
    pub file_date_ls: u32,
}

impl FixedFileInfo {
    /// Reads a `VS_FIXEDFILEINFO` block at `offset`, advancing it by 52.
    pub(crate) fn read(data: &[u8], offset: &mut usize) -> Result<FixedFileInfo> {
        Ok(FixedFileInfo {
            signature: read_le_at::<u32>(data, offset)?,
            struct_version: read_le_at::<u32>(data, offset)?,
            file_version_ms: read_le_at::<u32>(data, offset)?,
            file_version_ls: read_le_at::<u32>(data, offset)?,
            product_version_ms: read_le_at::<u32>(data, offset)?,
            product_version_ls: read_le_at::<u32>(data, offset)?,
            file_flags_mask: read_le_at::<u32>(data, offset)?,
            file_flags: read_le_at::<u32>(data, offset)?,
            file_os: read_le_at::<u32>(data, offset)?,
            file_type: read_le_at::<u32>(data, offset)?,
            file_subtype: read_le_at::<u32>(data, offset)?,
            file_date_ms: read_le_at::<u32>(data, offset)?,
            file_date_ls: read_le_at::<u32>(data, offset)?,
        })
    }

    /// Renders the file version in the conventional `a.b.c.d` form.
    #[must_use]
    pub fn file_version(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.file_version_ms >> 16,
            self.file_version_ms & 0xFFFF,
            self.file_version_ls >> 16,
            self.file_version_ls & 0xFFFF
        )
    }
}

/// One loaded module of the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Base address the image is loaded at
    pub base_of_image: u64,
    /// Size of the loaded image in bytes
    pub size_of_image: u32,
    /// PE header checksum
    pub checksum: u32,
    /// PE header link timestamp
    pub time_date_stamp: u32,
    /// Full path of the module, resolved from its out-of-line string record
    pub name: String,
    /// Fixed version resource of the image
    pub version_info: FixedFileInfo,
    /// Location of the CodeView debug record (PDB reference), if captured
    pub cv_record: LocationDescriptor,
    /// Location of the miscellaneous debug record, if captured
    pub misc_record: LocationDescriptor,
}

/// Decodes the module list stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the declared module count does not match
/// the count computed from the stream length, or if a module's name RVA does not
/// resolve within the file.
pub(crate) fn decode(
    source: &dyn Backend,
    entry: &DirectoryEntry,
) -> Result<Vec<ModuleDescriptor>> {
    let data = stream_slice(source, entry)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < 4 {
        return Err(stream_error!(
            "Module list of {} bytes is shorter than its count field",
            data.len()
        ));
    }

    let mut offset = 0;
    let declared = read_le_at::<u32>(data, &mut offset)? as usize;
    let computed = (data.len() - 4) / MODULE_RECORD_SIZE;
    if declared != computed {
        return Err(stream_error!(
            "Module count mismatch - declared {}, computed {}",
            declared,
            computed
        ));
    }

    let mut modules = Vec::with_capacity(declared);
    for _ in 0..declared {
        let base_of_image = read_le_at::<u64>(data, &mut offset)?;
        let size_of_image = read_le_at::<u32>(data, &mut offset)?;
        let checksum = read_le_at::<u32>(data, &mut offset)?;
        let time_date_stamp = read_le_at::<u32>(data, &mut offset)?;
        let name_rva = read_le_at::<u32>(data, &mut offset)?;
        let version_info = FixedFileInfo::read(data, &mut offset)?;
        let cv_record = LocationDescriptor::read(data, &mut offset)?;
        let misc_record = LocationDescriptor::read(data, &mut offset)?;

        // Reserved0 / Reserved1
        offset += 16;

        let name = if name_rva == 0 {
            String::new()
        } else {
            read_string(source, name_rva)?
        };

        modules.push(ModuleDescriptor {
            base_of_image,
            size_of_image,
            checksum,
            time_date_stamp,
            name,
            version_info,
            cv_record,
            misc_record,
        });
    }

    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    fn entry(length: u32, rva: u32) -> DirectoryEntry {
        DirectoryEntry {
            stream_type: crate::StreamType::ModuleList.raw(),
            length,
            rva,
        }
    }

    fn crafted_module_record(name_rva: u32) -> Vec<u8> {
        let mut record = Vec::with_capacity(MODULE_RECORD_SIZE);
        record.extend_from_slice(&0x7FFE_0000_u64.to_le_bytes()); // base
        record.extend_from_slice(&0x0001_C000_u32.to_le_bytes()); // image size
        record.extend_from_slice(&0x0001_F934_u32.to_le_bytes()); // checksum
        record.extend_from_slice(&0x5F00_0000_u32.to_le_bytes()); // timestamp
        record.extend_from_slice(&name_rva.to_le_bytes());
        record.extend_from_slice(&0xFEEF_04BD_u32.to_le_bytes()); // vs signature
        record.extend_from_slice(&0x0001_0000_u32.to_le_bytes()); // struct version
        record.extend_from_slice(&0x000A_0000_u32.to_le_bytes()); // file version 10.0
        record.extend_from_slice(&0x4A61_0000_u32.to_le_bytes()); // .19041.0
        record.extend_from_slice(&[0u8; 9 * 4]); // rest of VS_FIXEDFILEINFO
        record.extend_from_slice(&0x20_u32.to_le_bytes()); // cv size
        record.extend_from_slice(&0x800_u32.to_le_bytes()); // cv rva
        record.extend_from_slice(&[0u8; 8]); // misc record
        record.extend_from_slice(&[0u8; 16]); // reserved
        assert_eq!(record.len(), MODULE_RECORD_SIZE);
        record
    }

    #[test]
    fn crafted_without_name() {
        let mut image = Vec::new();
        image.extend_from_slice(&1_u32.to_le_bytes());
        image.extend_from_slice(&crafted_module_record(0)); // RVA 0 - no name record

        let source = Memory::new(image);
        let modules = decode(&source, &entry((4 + MODULE_RECORD_SIZE) as u32, 0)).unwrap();

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].base_of_image, 0x7FFE_0000);
        assert_eq!(modules[0].version_info.signature, 0xFEEF_04BD);
        assert_eq!(modules[0].version_info.file_version(), "10.0.19041.0");
        assert_eq!(modules[0].cv_record.rva, 0x800);
        assert_eq!(modules[0].name, "");
    }

    #[test]
    fn crafted_with_name() {
        // Image: [padding][string record "ntdll.dll"][module list stream]
        let mut image = vec![0u8; 4];
        let name_rva = image.len() as u32;
        image.extend_from_slice(&18_u32.to_le_bytes());
        for unit in "ntdll.dll".encode_utf16() {
            image.extend_from_slice(&unit.to_le_bytes());
        }
        image.extend_from_slice(&[0x00, 0x00]);

        let stream_rva = image.len() as u32;
        image.extend_from_slice(&1_u32.to_le_bytes());
        image.extend_from_slice(&crafted_module_record(name_rva));

        let source = Memory::new(image);
        let modules = decode(
            &source,
            &entry((4 + MODULE_RECORD_SIZE) as u32, stream_rva),
        )
        .unwrap();

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "ntdll.dll");
    }

    #[test]
    fn name_rva_out_of_bounds() {
        let mut image = Vec::new();
        image.extend_from_slice(&1_u32.to_le_bytes());
        image.extend_from_slice(&crafted_module_record(0xFFFF_0000));

        let source = Memory::new(image);
        let result = decode(&source, &entry((4 + MODULE_RECORD_SIZE) as u32, 0));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }

    #[test]
    fn zero_length_is_empty() {
        let source = Memory::new(Vec::new());
        assert!(decode(&source, &entry(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn count_mismatch() {
        let source = Memory::new(vec![0x05, 0x00, 0x00, 0x00]);
        let result = decode(&source, &entry(4, 0));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
