//! System information (`SystemInfoStream`, type 7).
//!
//! A singleton 56-byte record identifying the processor and operating system of the
//! machine the dump was taken on. The trailing 24-byte CPU block is a union keyed by
//! the processor architecture: x86 dumps carry the CPUID vendor string and feature
//! words, every other architecture carries two processor-feature words. The service
//! pack string resolves out-of-line, with RVA 0 meaning "none recorded".

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice, strings::read_string},
    Result,
};

/// Size in bytes of the on-disk system info record.
pub const SYSTEM_INFO_STREAM_SIZE: usize = 56;

/// `PROCESSOR_ARCHITECTURE_INTEL` - 32-bit x86.
pub const PROCESSOR_ARCHITECTURE_INTEL: u16 = 0;
/// `PROCESSOR_ARCHITECTURE_ARM` - 32-bit ARM.
pub const PROCESSOR_ARCHITECTURE_ARM: u16 = 5;
/// `PROCESSOR_ARCHITECTURE_IA64` - Itanium.
pub const PROCESSOR_ARCHITECTURE_IA64: u16 = 6;
/// `PROCESSOR_ARCHITECTURE_AMD64` - 64-bit x86.
pub const PROCESSOR_ARCHITECTURE_AMD64: u16 = 9;
/// `PROCESSOR_ARCHITECTURE_ARM64` - 64-bit ARM.
pub const PROCESSOR_ARCHITECTURE_ARM64: u16 = 12;
/// `PROCESSOR_ARCHITECTURE_UNKNOWN`.
pub const PROCESSOR_ARCHITECTURE_UNKNOWN: u16 = 0xFFFF;

/// Architecture-dependent CPU identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuInfo {
    /// x86 layout: CPUID vendor string and feature words
    X86 {
        /// CPUID 0 vendor registers (EBX, EDX, ECX - "GenuineIntel" and friends)
        vendor_id: [u32; 3],
        /// CPUID 1 EAX (family, model, stepping)
        version_information: u32,
        /// CPUID 1 EDX feature bits
        feature_information: u32,
        /// AMD extended feature bits (CPUID 0x80000001 EDX)
        amd_extended_cpu_features: u32,
    },
    /// Every other architecture: two processor-feature words
    Other {
        /// `PF_*` processor feature bits
        processor_features: [u64; 2],
    },
}

/// The decoded system info stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Processor architecture (`PROCESSOR_ARCHITECTURE_*`)
    pub processor_architecture: u16,
    /// Architecture-specific processor level (x86 family, ...)
    pub processor_level: u16,
    /// Architecture-specific processor revision (model/stepping, ...)
    pub processor_revision: u16,
    /// Number of logical processors
    pub number_of_processors: u8,
    /// OS product type (workstation, server, domain controller)
    pub product_type: u8,
    /// OS major version
    pub major_version: u32,
    /// OS minor version
    pub minor_version: u32,
    /// OS build number
    pub build_number: u32,
    /// OS platform id (`VER_PLATFORM_WIN32_NT` for NT kernels)
    pub platform_id: u32,
    /// Service pack string, empty when none was recorded
    pub csd_version: String,
    /// Product suite mask
    pub suite_mask: u16,
    /// Architecture-dependent CPU identification
    pub cpu: CpuInfo,
}

impl SystemInfo {
    /// Returns a human-readable name for the processor architecture.
    #[must_use]
    pub fn architecture_name(&self) -> &'static str {
        match self.processor_architecture {
            PROCESSOR_ARCHITECTURE_INTEL => "x86",
            PROCESSOR_ARCHITECTURE_ARM => "ARM",
            PROCESSOR_ARCHITECTURE_IA64 => "IA64",
            PROCESSOR_ARCHITECTURE_AMD64 => "x64",
            PROCESSOR_ARCHITECTURE_ARM64 => "ARM64",
            _ => "unknown",
        }
    }
}

/// Decodes the system info stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the stream is shorter than the fixed
/// record or the service pack RVA does not resolve within the file.
pub(crate) fn decode(source: &dyn Backend, entry: &DirectoryEntry) -> Result<SystemInfo> {
    let data = stream_slice(source, entry)?;
    if data.len() < SYSTEM_INFO_STREAM_SIZE {
        return Err(stream_error!(
            "System info stream of {} bytes is shorter than the {} byte record",
            data.len(),
            SYSTEM_INFO_STREAM_SIZE
        ));
    }

    let mut offset = 0;
    let processor_architecture = read_le_at::<u16>(data, &mut offset)?;
    let processor_level = read_le_at::<u16>(data, &mut offset)?;
    let processor_revision = read_le_at::<u16>(data, &mut offset)?;
    let number_of_processors = read_le_at::<u8>(data, &mut offset)?;
    let product_type = read_le_at::<u8>(data, &mut offset)?;
    let major_version = read_le_at::<u32>(data, &mut offset)?;
    let minor_version = read_le_at::<u32>(data, &mut offset)?;
    let build_number = read_le_at::<u32>(data, &mut offset)?;
    let platform_id = read_le_at::<u32>(data, &mut offset)?;
    let csd_version_rva = read_le_at::<u32>(data, &mut offset)?;
    let suite_mask = read_le_at::<u16>(data, &mut offset)?;
    offset += 2; // reserved

    let cpu = if processor_architecture == PROCESSOR_ARCHITECTURE_INTEL {
        let vendor_id = [
            read_le_at::<u32>(data, &mut offset)?,
            read_le_at::<u32>(data, &mut offset)?,
            read_le_at::<u32>(data, &mut offset)?,
        ];
        let version_information = read_le_at::<u32>(data, &mut offset)?;
        let feature_information = read_le_at::<u32>(data, &mut offset)?;
        let amd_extended_cpu_features = read_le_at::<u32>(data, &mut offset)?;
        CpuInfo::X86 {
            vendor_id,
            version_information,
            feature_information,
            amd_extended_cpu_features,
        }
    } else {
        let processor_features = [
            read_le_at::<u64>(data, &mut offset)?,
            read_le_at::<u64>(data, &mut offset)?,
        ];
        CpuInfo::Other { processor_features }
    };

    let csd_version = if csd_version_rva == 0 {
        String::new()
    } else {
        read_string(source, csd_version_rva)?
    };

    Ok(SystemInfo {
        processor_architecture,
        processor_level,
        processor_revision,
        number_of_processors,
        product_type,
        major_version,
        minor_version,
        build_number,
        platform_id,
        csd_version,
        suite_mask,
        cpu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    fn entry(length: u32, rva: u32) -> DirectoryEntry {
        DirectoryEntry {
            stream_type: crate::StreamType::SystemInfo.raw(),
            length,
            rva,
        }
    }

    fn crafted_stream(architecture: u16, csd_rva: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(SYSTEM_INFO_STREAM_SIZE);
        data.extend_from_slice(&architecture.to_le_bytes());
        data.extend_from_slice(&6_u16.to_le_bytes()); // level
        data.extend_from_slice(&0x5E03_u16.to_le_bytes()); // revision
        data.push(8); // processors
        data.push(1); // workstation
        data.extend_from_slice(&10_u32.to_le_bytes());
        data.extend_from_slice(&0_u32.to_le_bytes());
        data.extend_from_slice(&19045_u32.to_le_bytes());
        data.extend_from_slice(&2_u32.to_le_bytes()); // VER_PLATFORM_WIN32_NT
        data.extend_from_slice(&csd_rva.to_le_bytes());
        data.extend_from_slice(&0x100_u16.to_le_bytes()); // suite mask
        data.extend_from_slice(&0_u16.to_le_bytes()); // reserved
        data.extend_from_slice(&[0x47, 0x65, 0x6E, 0x75]); // "Genu"
        data.extend_from_slice(&[0x69, 0x6E, 0x65, 0x49]); // "ineI"
        data.extend_from_slice(&[0x6E, 0x74, 0x65, 0x6C]); // "ntel"
        data.extend_from_slice(&0x000A_0655_u32.to_le_bytes()); // version info
        data.extend_from_slice(&0xBFEB_FBFF_u32.to_le_bytes()); // features
        data.extend_from_slice(&0_u32.to_le_bytes());
        assert_eq!(data.len(), SYSTEM_INFO_STREAM_SIZE);
        data
    }

    #[test]
    fn crafted_x86() {
        let source = Memory::new(crafted_stream(PROCESSOR_ARCHITECTURE_INTEL, 0));
        let info = decode(&source, &entry(SYSTEM_INFO_STREAM_SIZE as u32, 0)).unwrap();

        assert_eq!(info.architecture_name(), "x86");
        assert_eq!(info.number_of_processors, 8);
        assert_eq!(info.build_number, 19045);
        assert_eq!(info.csd_version, "");
        match info.cpu {
            CpuInfo::X86 {
                vendor_id,
                feature_information,
                ..
            } => {
                // "GenuineIntel" split over the three registers
                assert_eq!(vendor_id, [0x756E_6547, 0x4965_6E69, 0x6C65_746E]);
                assert_eq!(feature_information, 0xBFEB_FBFF);
            }
            CpuInfo::Other { .. } => panic!("expected x86 CPU information"),
        }
    }

    #[test]
    fn crafted_amd64_with_csd() {
        // Image: [system info][string record "Service Pack 1"]
        let mut image = crafted_stream(PROCESSOR_ARCHITECTURE_AMD64, 0);
        let csd_rva = image.len() as u32;
        let units: Vec<u16> = "Service Pack 1".encode_utf16().collect();
        image.extend_from_slice(&((units.len() * 2) as u32).to_le_bytes());
        for unit in units {
            image.extend_from_slice(&unit.to_le_bytes());
        }
        image.extend_from_slice(&[0x00, 0x00]);

        // Patch the CSD RVA at offset 24
        image[24..28].copy_from_slice(&csd_rva.to_le_bytes());

        let source = Memory::new(image);
        let info = decode(&source, &entry(SYSTEM_INFO_STREAM_SIZE as u32, 0)).unwrap();

        assert_eq!(info.architecture_name(), "x64");
        assert_eq!(info.csd_version, "Service Pack 1");
        assert!(matches!(info.cpu, CpuInfo::Other { .. }));
    }

    #[test]
    fn too_short() {
        let source = Memory::new(vec![0u8; 32]);
        let result = decode(&source, &entry(32, 0));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }

    #[test]
    fn bad_csd_rva() {
        let source = Memory::new(crafted_stream(PROCESSOR_ARCHITECTURE_AMD64, 0xFFFF_0000));
        let result = decode(&source, &entry(SYSTEM_INFO_STREAM_SIZE as u32, 0));
        assert!(matches!(result, Err(crate::Error::StreamDecode { .. })));
    }
}
