//! Setup.bin container framing
//!
//! ## Layout
//!
//! The file is a sequence of 512-byte chunks. The first chunk is the file
//! header; each data record that follows occupies `DataRecordChunkCount`
//! chunks. All multi-byte fields are little-endian.
//!
//! | Offset | Size | File header field |
//! |--------|------|-------------------|
//! | 0 | 16 | Format signature GUID (one per major version) |
//! | 16 | 2 | RecordChunkCount (always 1) |
//! | 18 | 2 | RecordHeaderByteCount (36 + 2 × module count) |
//! | 20 | 4 | RecordNumber (0) |
//! | 24 | 1 | MajorVersion |
//! | 25 | 1 | MinorVersion |
//! | 26 | 2 | DataRecordCount |
//! | 28 | 2 | DataRecordsConsumed |
//! | 30 | 2 | DataRecordChunkCount |
//! | 32 | 2 | Flags (record consumption policy) |
//! | 34 | 2 | ModuleCount, then one `u16` per module id |
//!
//! | Offset | Size | Data record field |
//! |--------|------|-------------------|
//! | 0 | 4 | RecordTypeIdentifier |
//! | 4 | 4 | RecordFlags |
//! | 8 | 2 | RecordChunkCount |
//! | 10 | 2 | RecordHeaderByteCount (24) |
//! | 12 | 4 | RecordNumber |
//! | 16 | 8 | Reserved |
//! | 24 | .. | Entry area, passed through the integrity transform |
//!
//! Each entry is `module u16, variable u16, length u16, reserved u16`
//! followed by the value, zero-padded to four bytes. A zero module or
//! variable id ends the list; everything after it must be zero.

use std::collections::BTreeSet;
use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::codec::{decode_value, encode_value};
use crate::error::{SetupBinError, SetupBinResult};
use crate::registry::VariableRegistry;
use crate::scramble::{ByteScrambler, IntegrityTransform};
use crate::types::{Value, VariableEntry};
use crate::wire::{WireReader, WireWriter};

pub const CHUNK_SIZE: usize = 512;

/// The only format version this codec reads or writes.
pub const SUPPORTED_FILE_TYPE: u8 = 4;

/// `consumeRecordsFlag`: records are consumed after the firmware applies them.
pub const CONSUME_RECORDS: u8 = 0;
/// `consumeRecordsFlag`: records stay in place after being applied.
pub const DO_NOT_CONSUME: u8 = 1;

const FILE_HEADER_FIXED_LEN: usize = 36;
const RECORD_HEADER_LEN: usize = 24;
const ENTRY_HEADER_LEN: usize = 8;
const ENTRY_ALIGNMENT: usize = 4;

/// On-disk signature GUIDs, indexed by major version 1..=4.
const FILE_TYPE_SIGNATURES: [(u8, [u8; 16]); 4] = [
    (
        1,
        [
            0xb5, 0x16, 0xfb, 0x71, 0x87, 0xcb, 0xf9, 0x4a, 0xb4, 0x41, 0xca, 0x7b, 0x38, 0x35,
            0x78, 0xf9,
        ],
    ),
    (
        2,
        [
            0x96, 0xb2, 0x81, 0x58, 0xcf, 0x6b, 0x72, 0x4c, 0x8b, 0x91, 0xa1, 0x5e, 0x51, 0x2e,
            0x99, 0xc4,
        ],
    ),
    (
        3,
        [
            0xa7, 0xf7, 0xf6, 0xc6, 0x89, 0xc4, 0xf6, 0x47, 0x93, 0xed, 0xe2, 0xe5, 0x02, 0x0d,
            0xa5, 0x1d,
        ],
    ),
    (
        4,
        [
            0xaa, 0xa9, 0x34, 0x52, 0xe1, 0x29, 0xa9, 0x44, 0x8d, 0x4d, 0x08, 0x1c, 0x07, 0xb9,
            0x63, 0x53,
        ],
    ),
];

/// Signature bytes for a format version.
pub fn file_type_signature(file_type: u8) -> Option<[u8; 16]> {
    FILE_TYPE_SIGNATURES
        .iter()
        .find(|(ty, _)| *ty == file_type)
        .map(|(_, signature)| *signature)
}

fn file_type_for_signature(signature: &[u8; 16]) -> Option<u8> {
    FILE_TYPE_SIGNATURES
        .iter()
        .find(|(_, known)| known == signature)
        .map(|(ty, _)| *ty)
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RecordFlags: u32 {
        const VALID = 1 << 0;
        const SCRAMBLED = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RecordType {
    Invalid = 0,
    Data = 1,
}

/// One record of the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    record_type: RecordType,
    flags: RecordFlags,
    variables: Vec<VariableEntry>,
}

impl Record {
    /// A data record marked valid and scrambled.
    pub fn data(variables: Vec<VariableEntry>) -> Self {
        Self::new(
            RecordType::Data,
            RecordFlags::VALID | RecordFlags::SCRAMBLED,
            variables,
        )
    }

    pub fn new(record_type: RecordType, flags: RecordFlags, variables: Vec<VariableEntry>) -> Self {
        Self {
            record_type,
            flags,
            variables,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn flags(&self) -> RecordFlags {
        self.flags
    }

    pub fn variables(&self) -> &[VariableEntry] {
        &self.variables
    }

    pub fn into_variables(self) -> Vec<VariableEntry> {
        self.variables
    }
}

/// In-memory form of a Setup.bin file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupBinContainer {
    file_type: u8,
    consume_records: u8,
    records_consumed: u16,
    records: Vec<Record>,
}

impl SetupBinContainer {
    /// Start an empty container.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::UnsupportedFileType`] unless `file_type` is 4.
    pub fn create(file_type: u8, consume_records: u8) -> SetupBinResult<Self> {
        if file_type != SUPPORTED_FILE_TYPE {
            return Err(SetupBinError::UnsupportedFileType(file_type));
        }
        Ok(Self {
            file_type,
            consume_records,
            records_consumed: 0,
            records: Vec::new(),
        })
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn file_type(&self) -> u8 {
        self.file_type
    }

    pub fn consume_records(&self) -> u8 {
        self.consume_records
    }

    /// Counter the firmware bumps as it consumes records.
    pub fn records_consumed(&self) -> u16 {
        self.records_consumed
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Encoder/decoder bound to a registry and an integrity transform.
///
/// Holds no mutable state, so one codec can serve any number of threads.
#[derive(Debug, Clone)]
pub struct SetupBinCodec<T: IntegrityTransform = ByteScrambler> {
    registry: Arc<VariableRegistry>,
    transform: T,
}

impl SetupBinCodec<ByteScrambler> {
    /// Codec using the vendor scrambler.
    pub fn new(registry: Arc<VariableRegistry>) -> Self {
        Self::with_transform(registry, ByteScrambler::default())
    }
}

impl<T: IntegrityTransform> SetupBinCodec<T> {
    pub fn with_transform(registry: Arc<VariableRegistry>, transform: T) -> Self {
        Self {
            registry,
            transform,
        }
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Resolve and validate an ordered (name, value) list, then encode it as
    /// a single-record v4 file that the firmware keeps after applying.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::UnknownVariable`], [`SetupBinError::TypeMismatch`]
    /// or [`SetupBinError::DomainViolation`] before any bytes are produced.
    pub fn build_from_names<I, N>(&self, variables: I) -> SetupBinResult<Vec<u8>>
    where
        I: IntoIterator<Item = (N, Value)>,
        N: AsRef<str>,
    {
        let entries = variables
            .into_iter()
            .map(|(name, value)| {
                let definition = self.registry.resolve_by_name(name.as_ref())?;
                VariableEntry::new(definition, value)
            })
            .collect::<SetupBinResult<Vec<_>>>()?;

        let mut container = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
        container.push_record(Record::data(entries));
        self.encode(&container)
    }

    /// Decode a file and flatten its record into (name, value) pairs.
    ///
    /// # Errors
    ///
    /// Propagates every [`SetupBinCodec::decode`] failure.
    pub fn decode_to_names(&self, bytes: &[u8]) -> SetupBinResult<Vec<(String, Value)>> {
        Ok(self
            .decode(bytes)?
            .into_records()
            .into_iter()
            .flat_map(Record::into_variables)
            .map(VariableEntry::into_pair)
            .collect())
    }

    /// Serialize `container`. Output depends only on the input.
    ///
    /// # Errors
    ///
    /// Fails when an entry is not registered in this codec's registry, a
    /// value exceeds the 16-bit length field, or a size field overflows.
    pub fn encode(&self, container: &SetupBinContainer) -> SetupBinResult<Vec<u8>> {
        let signature = file_type_signature(container.file_type)
            .ok_or(SetupBinError::UnsupportedFileType(container.file_type))?;

        let payloads = container
            .records
            .iter()
            .map(|record| self.encode_entries(record))
            .collect::<SetupBinResult<Vec<_>>>()?;

        let record_chunks = payloads
            .iter()
            .map(|payload| RECORD_HEADER_LEN.saturating_add(payload.len()).div_ceil(CHUNK_SIZE).max(1))
            .max()
            .unwrap_or(0);
        let record_len = record_chunks.saturating_mul(CHUNK_SIZE);

        let modules: BTreeSet<u16> = container
            .records
            .iter()
            .flat_map(|record| record.variables.iter().map(VariableEntry::module_id))
            .collect();
        let header_bytes = FILE_HEADER_FIXED_LEN.saturating_add(modules.len().saturating_mul(2));
        if header_bytes > CHUNK_SIZE {
            return Err(SetupBinError::ValueTooLarge {
                name: "module list".to_string(),
                len: header_bytes,
            });
        }

        let mut out = WireWriter::with_capacity(
            CHUNK_SIZE.saturating_add(record_len.saturating_mul(payloads.len())),
        );
        out.write_bytes(&signature)
            .write_u16_le(1)
            .write_u16_le(to_u16("record header", header_bytes)?)
            .write_u32_le(0)
            .write_u8(container.file_type)
            .write_u8(0)
            .write_u16_le(to_u16("record count", container.records.len())?)
            .write_u16_le(container.records_consumed)
            .write_u16_le(to_u16("record", record_chunks)?)
            .write_u16_le(u16::from(container.consume_records))
            .write_u16_le(to_u16("module list", modules.len())?);
        for module_id in &modules {
            out.write_u16_le(*module_id);
        }
        out.pad_to(CHUNK_SIZE);

        for (index, (record, payload)) in container.records.iter().zip(payloads).enumerate() {
            let record_number = u32::try_from(index.saturating_add(1)).map_err(|e| {
                SetupBinError::ValueTooLarge {
                    name: format!("record number: {e}"),
                    len: index,
                }
            })?;

            let mut area = WireWriter::with_capacity(record_len);
            area.write_bytes(&payload)
                .pad_to(record_len.saturating_sub(RECORD_HEADER_LEN));
            let area = area.into_inner();
            let area = if record.flags.contains(RecordFlags::SCRAMBLED) {
                self.transform.apply(&area)
            } else {
                area
            };

            out.write_u32_le(record.record_type as u32)
                .write_u32_le(record.flags.bits())
                .write_u16_le(to_u16("record", record_chunks)?)
                .write_u16_le(to_u16("record header", RECORD_HEADER_LEN)?)
                .write_u32_le(record_number)
                .write_bytes(&[0u8; 8])
                .write_bytes(&area);
        }

        let out = out.into_inner();
        debug!(
            records = container.records.len(),
            modules = modules.len(),
            record_chunks,
            bytes = out.len(),
            "encoded Setup.bin"
        );
        Ok(out)
    }

    fn encode_entries(&self, record: &Record) -> SetupBinResult<Vec<u8>> {
        let mut out = WireWriter::default();
        for entry in &record.variables {
            let definition = self
                .registry
                .definition_by_id(entry.module_id(), entry.variable_id())?;
            definition.validate(entry.value())?;

            let bytes = encode_value(definition.variable_type(), entry.value())?;
            let len = u16::try_from(bytes.len()).ok().ok_or_else(|| {
                SetupBinError::ValueTooLarge {
                    name: entry.name().to_string(),
                    len: bytes.len(),
                }
            })?;

            trace!(
                module = entry.module_id(),
                variable = entry.variable_id(),
                len,
                "encoding entry"
            );
            out.write_u16_le(entry.module_id())
                .write_u16_le(entry.variable_id())
                .write_u16_le(len)
                .write_u16_le(0)
                .write_bytes(&bytes)
                .pad_to_multiple(ENTRY_ALIGNMENT);
        }
        Ok(out.into_inner())
    }

    /// Parse and fully validate a Setup.bin file.
    ///
    /// # Errors
    ///
    /// Any structural problem aborts the decode; no partial container is
    /// returned. See [`SetupBinError`] for the individual failure kinds.
    pub fn decode(&self, bytes: &[u8]) -> SetupBinResult<SetupBinContainer> {
        let header = bytes
            .get(..CHUNK_SIZE)
            .ok_or(SetupBinError::TruncatedFile {
                expected: CHUNK_SIZE,
                actual: bytes.len(),
            })?;
        let mut reader = WireReader::new(header);

        let signature: [u8; 16] = reader.read_array()?;
        let file_type = file_type_for_signature(&signature)
            .ok_or_else(|| SetupBinError::UnknownFileSignature(hex::encode(signature)))?;
        if file_type != SUPPORTED_FILE_TYPE {
            return Err(SetupBinError::UnsupportedFileType(file_type));
        }

        expect_field("header chunk count", 1, reader.read_u16_le()?)?;
        let header_bytes = reader.read_u16_le()?;
        reader.skip(4)?;
        expect_field("major version", usize::from(file_type), reader.read_u8()?)?;
        reader.skip(1)?;
        let record_count = reader.read_u16_le()?;
        let records_consumed = reader.read_u16_le()?;
        let record_chunks = usize::from(reader.read_u16_le()?);
        let flags = reader.read_u16_le()?;
        let module_count = usize::from(reader.read_u16_le()?);
        expect_field(
            "record header byte count",
            FILE_HEADER_FIXED_LEN.saturating_add(module_count.saturating_mul(2)),
            header_bytes,
        )?;
        let consume_records = u8::try_from(flags).ok().ok_or(SetupBinError::HeaderMismatch {
            field: "flags",
            expected: usize::from(u8::MAX),
            actual: usize::from(flags),
        })?;
        let modules = (0..module_count)
            .map(|_| reader.read_u16_le())
            .collect::<SetupBinResult<BTreeSet<u16>>>()?;

        debug!(
            file_type,
            record_count,
            record_chunks,
            modules = modules.len(),
            "parsed Setup.bin header"
        );

        if record_count != 1 {
            return Err(SetupBinError::UnexpectedRecordCount(usize::from(record_count)));
        }
        let body = bytes.get(CHUNK_SIZE..).unwrap_or_default();
        if body.is_empty() {
            return Err(SetupBinError::UnexpectedRecordCount(0));
        }
        if record_chunks == 0 {
            return Err(SetupBinError::HeaderMismatch {
                field: "data record chunk count",
                expected: body.len().div_ceil(CHUNK_SIZE),
                actual: 0,
            });
        }
        let record_len = record_chunks.saturating_mul(CHUNK_SIZE);
        if !body.len().is_multiple_of(record_len) {
            return Err(SetupBinError::TruncatedFile {
                expected: CHUNK_SIZE.saturating_add(body.len().next_multiple_of(record_len)),
                actual: bytes.len(),
            });
        }
        let present = body.len() / record_len;
        if present != 1 {
            return Err(SetupBinError::UnexpectedRecordCount(present));
        }

        let record = self.decode_record(body, record_chunks)?;
        for entry in &record.variables {
            if !modules.contains(&entry.module_id()) {
                return Err(SetupBinError::IntegrityCheckFailed(format!(
                    "module {} missing from header module list",
                    entry.module_id()
                )));
            }
        }

        Ok(SetupBinContainer {
            file_type,
            consume_records,
            records_consumed,
            records: vec![record],
        })
    }

    fn decode_record(&self, record: &[u8], record_chunks: usize) -> SetupBinResult<Record> {
        let mut reader = WireReader::new(record);
        let record_type = reader.read_u32_le()?;
        let raw_flags = reader.read_u32_le()?;
        expect_field("record chunk count", record_chunks, reader.read_u16_le()?)?;
        expect_field("record header length", RECORD_HEADER_LEN, reader.read_u16_le()?)?;
        reader.skip(4 + 8)?;

        let flags = RecordFlags::from_bits(raw_flags)
            .ok_or(SetupBinError::UnsupportedRecordFlags(raw_flags))?;
        if !flags.contains(RecordFlags::VALID) {
            return Err(SetupBinError::IntegrityCheckFailed(
                "record is not marked valid".to_string(),
            ));
        }
        if flags != RecordFlags::VALID | RecordFlags::SCRAMBLED {
            return Err(SetupBinError::UnsupportedRecordFlags(raw_flags));
        }

        let area = self.transform.invert(reader.rest())?;
        if record_type != RecordType::Data as u32 {
            return Err(SetupBinError::InvalidRecordType(record_type));
        }

        let variables = self.decode_entries(&area)?;
        trace!(entries = variables.len(), "decoded data record");
        Ok(Record::new(RecordType::Data, flags, variables))
    }

    fn decode_entries(&self, area: &[u8]) -> SetupBinResult<Vec<VariableEntry>> {
        let mut reader = WireReader::new(area);
        let mut entries = Vec::new();

        let tail_start = loop {
            let start = reader.position();
            if reader.remaining() < ENTRY_HEADER_LEN {
                break start;
            }
            let module_id = reader.read_u16_le()?;
            let variable_id = reader.read_u16_le()?;
            if module_id == 0 || variable_id == 0 {
                break start;
            }
            let len = usize::from(reader.read_u16_le()?);
            reader.skip(2)?;

            let definition = self.registry.definition_by_id(module_id, variable_id)?;
            let ty = definition.variable_type();
            if reader.remaining() < len {
                return Err(SetupBinError::TruncatedValue {
                    ty,
                    expected: len,
                    actual: reader.remaining(),
                });
            }
            let raw = reader.read_bytes(len)?;
            let value = decode_value(ty, raw)?;
            entries.push(VariableEntry::new(definition, value)?);

            let padding = len.next_multiple_of(ENTRY_ALIGNMENT).saturating_sub(len);
            let padding = reader.read_bytes(padding.min(reader.remaining()))?;
            if padding.iter().any(|b| *b != 0) {
                return Err(SetupBinError::IntegrityCheckFailed(format!(
                    "non-zero padding after {}",
                    definition.name()
                )));
            }
        };

        let tail = area.get(tail_start..).unwrap_or_default();
        if let Some(offset) = tail.iter().position(|b| *b != 0) {
            return Err(SetupBinError::IntegrityCheckFailed(format!(
                "non-zero byte {offset} bytes past the entry list"
            )));
        }
        Ok(entries)
    }
}

fn to_u16(field: &str, value: usize) -> SetupBinResult<u16> {
    u16::try_from(value)
        .ok()
        .ok_or_else(|| SetupBinError::ValueTooLarge {
            name: field.to_string(),
            len: value,
        })
}

fn expect_field(
    field: &'static str,
    expected: usize,
    actual: impl Into<usize>,
) -> SetupBinResult<()> {
    let actual = actual.into();
    if actual == expected {
        Ok(())
    } else {
        Err(SetupBinError::HeaderMismatch {
            field,
            expected,
            actual,
        })
    }
}
