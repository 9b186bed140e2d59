//! Synthetic minidump containers for unit tests.
//!
//! [`DumpBuilder`] assembles well-formed (or deliberately corrupt) container images in
//! memory, fixing up the header, directory, and stream offsets automatically. The
//! layout it produces is `[header][aux pool][directory][stream payloads]`: the aux pool
//! directly after the header holds out-of-line string records, so their RVAs are known
//! the moment they are added and can be embedded in stream payloads built afterwards.

/// Capture timestamp used by builder-produced containers.
pub(crate) const TEST_TIMESTAMP: u32 = 0x5F5E_0F00;

use crate::minidump::header::{DUMP_HEADER_MAGIC, DUMP_HEADER_SIZE, DUMP_HEADER_VERSION};

enum StreamSpec {
    /// A stream whose payload is placed by the builder
    Payload { stream_type: u32, bytes: Vec<u8> },
    /// A raw directory entry with caller-chosen length/rva, for corruption tests
    Raw {
        stream_type: u32,
        length: u32,
        rva: u32,
    },
}

/// Builder for synthetic minidump container images.
pub(crate) struct DumpBuilder {
    aux: Vec<u8>,
    streams: Vec<StreamSpec>,
    flags: u64,
}

impl DumpBuilder {
    pub(crate) fn new() -> DumpBuilder {
        DumpBuilder {
            aux: Vec::new(),
            streams: Vec::new(),
            flags: 0,
        }
    }

    /// Sets the header capture flags.
    pub(crate) fn flags(&mut self, flags: u64) -> &mut DumpBuilder {
        self.flags = flags;
        self
    }

    /// Adds a UTF-16 string record to the aux pool and returns its RVA.
    ///
    /// Must be called before [`DumpBuilder::build`]; the returned RVA is final and can
    /// be embedded in stream payloads.
    pub(crate) fn string_utf16(&mut self, text: &str) -> u32 {
        let rva = (DUMP_HEADER_SIZE + self.aux.len()) as u32;

        let units: Vec<u16> = text.encode_utf16().collect();
        self.aux
            .extend_from_slice(&((units.len() * 2) as u32).to_le_bytes());
        for unit in units {
            self.aux.extend_from_slice(&unit.to_le_bytes());
        }
        self.aux.extend_from_slice(&[0x00, 0x00]);

        rva
    }

    /// Adds raw bytes to the aux pool and returns their RVA.
    pub(crate) fn aux_bytes(&mut self, bytes: &[u8]) -> u32 {
        let rva = (DUMP_HEADER_SIZE + self.aux.len()) as u32;
        self.aux.extend_from_slice(bytes);
        rva
    }

    /// Adds a stream with the given payload; length and RVA are fixed up at build time.
    pub(crate) fn stream(&mut self, stream_type: u32, bytes: Vec<u8>) -> &mut DumpBuilder {
        self.streams.push(StreamSpec::Payload { stream_type, bytes });
        self
    }

    /// Adds a directory entry with caller-chosen length and RVA, without a payload.
    pub(crate) fn raw_directory_entry(
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
    pub(crate) fn build(&self) -> Vec<u8> {
        let directory_rva = DUMP_HEADER_SIZE + self.aux.len();
        let mut payload_rva = directory_rva + self.streams.len() * 12;

        let mut image = Vec::new();
        image.extend_from_slice(&DUMP_HEADER_MAGIC.to_le_bytes());
        image.extend_from_slice(&DUMP_HEADER_VERSION.to_le_bytes());
        image.extend_from_slice(&(self.streams.len() as u32).to_le_bytes());
        image.extend_from_slice(&(directory_rva as u32).to_le_bytes());
        image.extend_from_slice(&0_u32.to_le_bytes()); // checksum
        image.extend_from_slice(&TEST_TIMESTAMP.to_le_bytes());
        image.extend_from_slice(&self.flags.to_le_bytes());
        debug_assert_eq!(image.len(), DUMP_HEADER_SIZE);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Session, StreamType};

    #[test]
    fn builder_produces_openable_containers() {
        let mut builder = DumpBuilder::new();
        builder.stream(StreamType::ThreadList.raw(), 0_u32.to_le_bytes().to_vec());
        let session = Session::from_mem(builder.build()).unwrap();

        assert_eq!(session.header().stream_count, 1);
        assert_eq!(session.header().time_date_stamp, TEST_TIMESTAMP);
        assert_eq!(session.list_streams(), vec![StreamType::ThreadList]);
    }

    #[test]
    fn aux_strings_resolve() {
        let mut builder = DumpBuilder::new();
        let name_rva = builder.string_utf16("main");

        let mut payload = Vec::new();
        payload.extend_from_slice(&1_u32.to_le_bytes());
        payload.extend_from_slice(&0x10_u32.to_le_bytes());
        payload.extend_from_slice(&u64::from(name_rva).to_le_bytes());
        builder.stream(StreamType::ThreadNames.raw(), payload);

        let session = Session::from_mem(builder.build()).unwrap();
        let stream = session.read_stream(StreamType::ThreadNames).unwrap().unwrap();
        let names = stream.as_thread_names().unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names[0].thread_id, 0x10);
        assert_eq!(names[0].name, "main");
    }
}
