//! Shared helpers for integration tests: a small synthetic-container builder.
//!
//! Layout produced: `[header][aux pool][directory][stream payloads]`. Aux records are
//! placed directly after the header so their RVAs are final as soon as they are added
//! and can be embedded into stream payloads built afterwards.

#![allow(dead_code)]

/// "MDMP"
pub const SIGNATURE: u32 = 0x504D_444D;
/// Low word of the header version field
pub const VERSION: u32 = 0xA793;
/// Size of the fixed container header
pub const HEADER_SIZE: usize = 32;

enum StreamSpec {
    Payload { stream_type: u32, bytes: Vec<u8> },
    Raw { stream_type: u32, length: u32, rva: u32 },
}

/// Builder for synthetic minidump container images.
pub struct DumpBuilder {
    aux: Vec<u8>,
    streams: Vec<StreamSpec>,
}

impl DumpBuilder {
    pub fn new() -> DumpBuilder {
        DumpBuilder {
            aux: Vec::new(),
            streams: Vec::new(),
        }
    }

    /// Adds a UTF-16 string record to the aux pool and returns its RVA.
    pub fn string_utf16(&mut self, text: &str) -> u32 {
        let rva = (HEADER_SIZE + self.aux.len()) as u32;

        let units: Vec<u16> = text.encode_utf16().collect();
        self.aux
            .extend_from_slice(&((units.len() * 2) as u32).to_le_bytes());
        for unit in units {
            self.aux.extend_from_slice(&unit.to_le_bytes());
        }
        self.aux.extend_from_slice(&[0x00, 0x00]);

        rva
    }

    /// Adds a stream with the given payload; length and RVA are fixed up at build time.
    pub fn stream(&mut self, stream_type: u32, bytes: Vec<u8>) -> &mut DumpBuilder {
        self.streams.push(StreamSpec::Payload { stream_type, bytes });
        self
    }

    /// Adds a directory entry with caller-chosen length and RVA, without a payload.
    pub fn raw_directory_entry(
        &mut self,
        stream_type: u32,
        length: u32,
        rva: u32,
    ) -> &mut DumpBuilder {
        self.streams.push(StreamSpec::Raw {
            stream_type,
            length,
            rva,
        });
        self
    }

    /// Assembles the container image.
    pub fn build(&self) -> Vec<u8> {
        let directory_rva = HEADER_SIZE + self.aux.len();
        let mut payload_rva = directory_rva + self.streams.len() * 12;

        let mut image = Vec::new();
        image.extend_from_slice(&SIGNATURE.to_le_bytes());
        image.extend_from_slice(&VERSION.to_le_bytes());
        image.extend_from_slice(&(self.streams.len() as u32).to_le_bytes());
        image.extend_from_slice(&(directory_rva as u32).to_le_bytes());
        image.extend_from_slice(&0_u32.to_le_bytes()); // checksum
        image.extend_from_slice(&0x6000_0000_u32.to_le_bytes()); // timestamp
        image.extend_from_slice(&0_u64.to_le_bytes()); // flags
        assert_eq!(image.len(), HEADER_SIZE);

        image.extend_from_slice(&self.aux);

        for spec in &self.streams {
            match spec {
                StreamSpec::Payload { stream_type, bytes } => {
                    image.extend_from_slice(&stream_type.to_le_bytes());
                    image.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                    image.extend_from_slice(&(payload_rva as u32).to_le_bytes());
                    payload_rva += bytes.len();
                }
                StreamSpec::Raw {
                    stream_type,
                    length,
                    rva,
                } => {
                    image.extend_from_slice(&stream_type.to_le_bytes());
                    image.extend_from_slice(&length.to_le_bytes());
                    image.extend_from_slice(&rva.to_le_bytes());
                }
            }
        }

        for spec in &self.streams {
            if let StreamSpec::Payload { bytes, .. } = spec {
                image.extend_from_slice(bytes);
            }
        }

        image
    }
}

/// Encodes one 48-byte thread record.
pub fn thread_record(thread_id: u32, teb: u64, stack_start: u64) -> Vec<u8> {
    let mut record = Vec::with_capacity(48);
    record.extend_from_slice(&thread_id.to_le_bytes());
    record.extend_from_slice(&0_u32.to_le_bytes()); // suspend count
    record.extend_from_slice(&0x20_u32.to_le_bytes()); // priority class
    record.extend_from_slice(&8_u32.to_le_bytes()); // priority
    record.extend_from_slice(&teb.to_le_bytes());
    record.extend_from_slice(&stack_start.to_le_bytes());
    record.extend_from_slice(&0x1000_u32.to_le_bytes()); // stack size
    record.extend_from_slice(&0_u32.to_le_bytes()); // stack rva
    record.extend_from_slice(&0x4D0_u32.to_le_bytes()); // context size
    record.extend_from_slice(&0_u32.to_le_bytes()); // context rva
    assert_eq!(record.len(), 48);
    record
}

/// Encodes a thread list stream payload.
pub fn thread_list(records: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        payload.extend_from_slice(record);
    }
    payload
}

/// Encodes one 108-byte module record referencing an out-of-line name.
pub fn module_record(base: u64, size: u32, name_rva: u32) -> Vec<u8> {
    let mut record = Vec::with_capacity(108);
    record.extend_from_slice(&base.to_le_bytes());
    record.extend_from_slice(&size.to_le_bytes());
    record.extend_from_slice(&0_u32.to_le_bytes()); // checksum
    record.extend_from_slice(&0x5F00_0000_u32.to_le_bytes()); // timestamp
    record.extend_from_slice(&name_rva.to_le_bytes());
    record.extend_from_slice(&0xFEEF_04BD_u32.to_le_bytes()); // vs signature
    record.extend_from_slice(&[0u8; 12 * 4]); // rest of VS_FIXEDFILEINFO
    record.extend_from_slice(&[0u8; 16]); // cv + misc records
    record.extend_from_slice(&[0u8; 16]); // reserved
    assert_eq!(record.len(), 108);
    record
}

/// Encodes a module list stream payload.
pub fn module_list(records: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        payload.extend_from_slice(record);
    }
    payload
}

/// Encodes a 168-byte exception stream payload.
pub fn exception_stream(thread_id: u32, code: u32, address: u64) -> Vec<u8> {
    let mut payload = Vec::with_capacity(168);
    payload.extend_from_slice(&thread_id.to_le_bytes());
    payload.extend_from_slice(&[0u8; 4]); // alignment
    payload.extend_from_slice(&code.to_le_bytes());
    payload.extend_from_slice(&1_u32.to_le_bytes()); // non-continuable
    payload.extend_from_slice(&0_u64.to_le_bytes()); // no chained record
    payload.extend_from_slice(&address.to_le_bytes());
    payload.extend_from_slice(&0_u32.to_le_bytes()); // no parameters
    payload.extend_from_slice(&[0u8; 4]); // alignment
    payload.extend_from_slice(&[0u8; 15 * 8]); // parameter slots
    payload.extend_from_slice(&0x4D0_u32.to_le_bytes()); // context size
    payload.extend_from_slice(&0x3000_u32.to_le_bytes()); // context rva
    assert_eq!(payload.len(), 168);
    payload
}

/// Encodes a Memory64 stream payload.
pub fn memory64_list(base_rva: u64, ranges: &[(u64, u64)]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(ranges.len() as u64).to_le_bytes());
    payload.extend_from_slice(&base_rva.to_le_bytes());
    for (start, size) in ranges {
        payload.extend_from_slice(&start.to_le_bytes());
        payload.extend_from_slice(&size.to_le_bytes());
    }
    payload
}
