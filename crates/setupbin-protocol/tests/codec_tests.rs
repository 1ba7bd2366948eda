//! End-to-end encode/decode scenarios for Setup.bin files.

use std::sync::Arc;

use insta::assert_snapshot;
use setupbin_protocol::prelude::*;
use setupbin_protocol::{CERTIFICATE_ADDITION, CHUNK_SIZE, file_type_signature};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const POWER_PACKAGE: &str = "46732273-DC23-2F43-A98A-13D37982D855";

fn registry() -> Result<Arc<VariableRegistry>, SetupBinError> {
    Ok(Arc::new(VariableRegistry::amt()?))
}

fn codec() -> Result<SetupBinCodec, SetupBinError> {
    Ok(SetupBinCodec::new(registry()?))
}

fn entry(registry: &VariableRegistry, name: &str, value: Value) -> Result<VariableEntry, SetupBinError> {
    VariableEntry::new(registry.resolve_by_name(name)?, value)
}

fn password_file(codec: &SetupBinCodec) -> Result<Vec<u8>, SetupBinError> {
    codec.build_from_names([("New MEBx Password", Value::text("HeyH0Password!"))])
}

fn set_byte(bytes: &mut [u8], offset: usize, value: u8) -> Result<(), String> {
    let slot = bytes
        .get_mut(offset)
        .ok_or_else(|| format!("offset {offset} out of range"))?;
    *slot = value;
    Ok(())
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn new_password_round_trips() -> TestResult {
    let codec = codec()?;
    let bytes = password_file(&codec)?;
    let container = codec.decode(&bytes)?;

    assert_eq!(container.records().len(), 1);
    let record = container.records().first().ok_or("no record")?;
    assert_eq!(record.variables().len(), 1);
    let var = record.variables().first().ok_or("no variable")?;
    assert_eq!((var.module_id(), var.variable_id()), (1, 2));
    assert_eq!(var.name(), "New MEBx Password");
    assert_eq!(var.value(), &Value::text("HeyH0Password!"));
    Ok(())
}

#[test]
fn default_provisioning_list_round_trips() -> TestResult {
    let codec = codec()?;
    let vars = vec![
        ("Current MEBx Password".to_string(), Value::text("admin")),
        ("New MEBx Password".to_string(), Value::text("HeyH0Password!")),
        ("Manageability Feature Selection".to_string(), Value::I8(1)),
        ("Power Package".to_string(), Value::guid(POWER_PACKAGE)?),
        ("SOL/IDER Redirection Configuration".to_string(), Value::I8(7)),
        ("DHCP".to_string(), Value::I8(2)),
        ("Shared/Dedicated FQDN".to_string(), Value::I8(1)),
        ("Remote Desktop (KVM) State".to_string(), Value::I8(1)),
        ("Opt-in User Consent Option".to_string(), Value::I8(0)),
        ("Opt-in Remote IT Consent Policy".to_string(), Value::I8(1)),
    ];
    let bytes = codec.build_from_names(vars.clone())?;
    assert_eq!(bytes.len(), 2 * CHUNK_SIZE);
    assert_eq!(codec.decode_to_names(&bytes)?, vars);
    Ok(())
}

#[test]
fn certificate_field_round_trips() -> TestResult {
    let codec = codec()?;
    let spec = CertificateSpec::parse(
        "a5e1b6b4c1b8ce8d9f0b3ed4a1c1ec4d6f8b1e2c3d4e5f60718293a4b5c6d7e8 Fabrikam Root",
    )?;
    let bytes = codec.build_from_names([
        (CERTIFICATE_ADDITION, Value::Text(spec.pack()?)),
        ("Pre-Installed Certificates Enabled", Value::I8(0)),
    ])?;
    let decoded = codec.decode_to_names(&bytes)?;
    let (name, value) = decoded.first().ok_or("empty decode")?;
    assert_eq!(name, CERTIFICATE_ADDITION);
    let field = CertificateField::unpack(value.as_bytes().ok_or("not text")?)?;
    assert_eq!(field.algorithm, HashAlgorithm::Sha256);
    assert_eq!(field.hash, spec.hash_hex());
    assert_eq!(field.name, "Fabrikam Root");
    Ok(())
}

#[test]
fn empty_variable_list_is_a_valid_file() -> TestResult {
    let codec = codec()?;
    let bytes = codec.build_from_names(Vec::<(&str, Value)>::new())?;
    assert_eq!(bytes.len(), 2 * CHUNK_SIZE);
    assert!(codec.decode_to_names(&bytes)?.is_empty());
    Ok(())
}

#[test]
fn codec_is_shareable_across_threads() -> TestResult {
    let codec = Arc::new(codec()?);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8i8)
            .map(|i| {
                let codec = Arc::clone(&codec);
                scope.spawn(move || -> Result<(), SetupBinError> {
                    let vars = vec![
                        ("Hostname".to_string(), Value::text(format!("node-{i}"))),
                        ("Opt-in User Consent Option".to_string(), Value::I8(i % 2)),
                    ];
                    let bytes = codec.build_from_names(vars.clone())?;
                    assert_eq!(codec.decode_to_names(&bytes)?, vars);
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .try_for_each(|h| h.join().map_err(|_panic| "worker panicked".to_string())?.map_err(|e| e.to_string()))
    })?;
    Ok(())
}

// ── Validation before encoding ──────────────────────────────────────────────

#[test]
fn wrong_type_fails_before_encoding() -> TestResult {
    let codec = codec()?;
    let err = codec
        .build_from_names([("DHCP", Value::guid(POWER_PACKAGE)?)])
        .err()
        .ok_or("GUID accepted for an Int8 variable")?;
    assert_snapshot!(err.to_string(), @"Type mismatch for DHCP: expected Int8, got GUID");
    Ok(())
}

#[test]
fn unknown_name_fails() -> TestResult {
    let codec = codec()?;
    let err = codec
        .build_from_names([("Favourite Colour", Value::text("blue"))])
        .err()
        .ok_or("unknown name accepted")?;
    assert_eq!(err, SetupBinError::UnknownVariable("Favourite Colour".to_string()));
    Ok(())
}

#[test]
fn domain_violations_fail() -> TestResult {
    let codec = codec()?;
    let err = codec
        .build_from_names([("DHCP", Value::I8(3))])
        .err()
        .ok_or("DHCP=3 accepted")?;
    assert_snapshot!(err.to_string(), @"Value out of domain for DHCP: 3 is not one of [1, 2]");

    let err = codec
        .build_from_names([("Hostname", Value::text("h".repeat(64)))])
        .err()
        .ok_or("64-byte hostname accepted")?;
    assert_snapshot!(err.to_string(), @"Value out of domain for Hostname: 64 bytes exceeds maximum of 63");
    Ok(())
}

#[test]
fn entries_from_another_registry_are_rejected() -> TestResult {
    let codec = codec()?;
    let foreign = VariableRegistry::build(&setupbin_protocol::Catalog::from([(
        9,
        std::collections::BTreeMap::from([(
            1,
            setupbin_protocol::CatalogEntry::new(1, "Foreign", None),
        )]),
    )]))?;
    let mut container = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
    container.push_record(Record::data(vec![entry(&foreign, "Foreign", Value::I8(1))?]));
    assert_eq!(
        codec.encode(&container),
        Err(SetupBinError::UnknownVariableId {
            module_id: 9,
            variable_id: 1
        })
    );
    Ok(())
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[test]
fn snapshot_password_file_header() -> TestResult {
    let codec = codec()?;
    let bytes = password_file(&codec)?;
    let header = bytes.get(..48).ok_or("short file")?;
    assert_snapshot!(
        hex::encode(header),
        @"aaa93452e129a9448d4d081c07b963530100260000000000040001000000010001000100010000000000000000000000"
    );
    Ok(())
}

#[test]
fn snapshot_password_file_record() -> TestResult {
    let codec = codec()?;
    let bytes = password_file(&codec)?;
    assert_eq!(bytes.len(), 1024);
    let record = bytes.get(512..576).ok_or("short file")?;
    assert_snapshot!(
        hex::encode(record),
        @"010000000300000001001800010000000000000000000000121113111f11111159768a5941617284848880837532111111111111111111111111111111111111"
    );
    // remaining padding is scrambled zeros
    assert!(bytes.get(576..).ok_or("short file")?.iter().all(|b| *b == 0x11));
    Ok(())
}

// ── Decode failures ─────────────────────────────────────────────────────────

#[test]
fn older_file_types_are_unsupported() -> TestResult {
    let codec = codec()?;
    for version in 1..=3u8 {
        let mut bytes = password_file(&codec)?;
        let signature = file_type_signature(version).ok_or("missing signature")?;
        for (offset, b) in signature.iter().enumerate() {
            set_byte(&mut bytes, offset, *b)?;
        }
        set_byte(&mut bytes, 24, version)?;
        assert_eq!(
            codec.decode(&bytes),
            Err(SetupBinError::UnsupportedFileType(version))
        );
    }
    Ok(())
}

#[test]
fn unknown_signature_is_rejected() -> TestResult {
    let codec = codec()?;
    let mut bytes = password_file(&codec)?;
    set_byte(&mut bytes, 0, 0x00)?;
    assert!(matches!(
        codec.decode(&bytes),
        Err(SetupBinError::UnknownFileSignature(_))
    ));
    Ok(())
}

#[test]
fn major_version_must_match_signature() -> TestResult {
    let codec = codec()?;
    let mut bytes = password_file(&codec)?;
    set_byte(&mut bytes, 24, 3)?;
    assert_eq!(
        codec.decode(&bytes),
        Err(SetupBinError::HeaderMismatch {
            field: "major version",
            expected: 4,
            actual: 3
        })
    );
    Ok(())
}

#[test]
fn zero_records_are_rejected() -> TestResult {
    let codec = codec()?;
    let empty = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
    let bytes = codec.encode(&empty)?;
    assert_eq!(bytes.len(), CHUNK_SIZE);
    assert_eq!(codec.decode(&bytes), Err(SetupBinError::UnexpectedRecordCount(0)));

    // header claims a record but the body is missing
    let full = password_file(&codec)?;
    let header_only = full.get(..CHUNK_SIZE).ok_or("short file")?;
    assert_eq!(
        codec.decode(header_only),
        Err(SetupBinError::UnexpectedRecordCount(0))
    );
    Ok(())
}

#[test]
fn two_records_are_rejected() -> TestResult {
    let registry = registry()?;
    let codec = SetupBinCodec::new(Arc::clone(&registry));
    let mut container = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
    container.push_record(Record::data(vec![entry(&registry, "DHCP", Value::I8(2))?]));
    container.push_record(Record::data(vec![entry(&registry, "DHCP", Value::I8(1))?]));
    let bytes = codec.encode(&container)?;
    assert_eq!(bytes.len(), 3 * CHUNK_SIZE);
    assert_eq!(codec.decode(&bytes), Err(SetupBinError::UnexpectedRecordCount(2)));

    // a second record appended behind a header that claims one
    let mut doubled = password_file(&codec)?;
    let record = doubled.get(CHUNK_SIZE..).ok_or("short file")?.to_vec();
    doubled.extend_from_slice(&record);
    assert_eq!(codec.decode(&doubled), Err(SetupBinError::UnexpectedRecordCount(2)));
    Ok(())
}

#[test]
fn truncated_files_are_rejected() -> TestResult {
    let codec = codec()?;
    let bytes = password_file(&codec)?;
    assert_eq!(
        codec.decode(bytes.get(..100).ok_or("short file")?),
        Err(SetupBinError::TruncatedFile {
            expected: 512,
            actual: 100
        })
    );
    assert!(matches!(
        codec.decode(bytes.get(..1000).ok_or("short file")?),
        Err(SetupBinError::TruncatedFile { .. })
    ));
    assert!(codec.decode(&[]).is_err());
    Ok(())
}

#[test]
fn non_data_record_is_rejected() -> TestResult {
    let registry = registry()?;
    let codec = SetupBinCodec::new(Arc::clone(&registry));
    let mut container = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
    container.push_record(Record::new(
        RecordType::Invalid,
        RecordFlags::VALID | RecordFlags::SCRAMBLED,
        vec![entry(&registry, "DHCP", Value::I8(2))?],
    ));
    let bytes = codec.encode(&container)?;
    assert_eq!(codec.decode(&bytes), Err(SetupBinError::InvalidRecordType(0)));
    Ok(())
}

#[test]
fn record_flags_are_enforced() -> TestResult {
    let registry = registry()?;
    let codec = SetupBinCodec::new(Arc::clone(&registry));
    let encode_with = |flags: RecordFlags| -> Result<Vec<u8>, SetupBinError> {
        let mut container = SetupBinContainer::create(SUPPORTED_FILE_TYPE, DO_NOT_CONSUME)?;
        container.push_record(Record::new(
            RecordType::Data,
            flags,
            vec![entry(&registry, "DHCP", Value::I8(2))?],
        ));
        codec.encode(&container)
    };

    assert_eq!(
        codec.decode(&encode_with(RecordFlags::VALID)?),
        Err(SetupBinError::UnsupportedRecordFlags(1))
    );
    assert!(matches!(
        codec.decode(&encode_with(RecordFlags::SCRAMBLED)?),
        Err(SetupBinError::IntegrityCheckFailed(_))
    ));

    let mut bytes = encode_with(RecordFlags::VALID | RecordFlags::SCRAMBLED)?;
    set_byte(&mut bytes, 512 + 4, 0x07)?;
    assert_eq!(codec.decode(&bytes), Err(SetupBinError::UnsupportedRecordFlags(7)));
    Ok(())
}

#[test]
fn corrupted_padding_fails_integrity_check() -> TestResult {
    let codec = codec()?;
    let mut bytes = password_file(&codec)?;
    let last = bytes.len() - 1;
    set_byte(&mut bytes, last, 0x12)?;
    let err = codec.decode(&bytes).err().ok_or("corruption accepted")?;
    assert_snapshot!(err.to_string(), @"Integrity check failed: non-zero byte 463 bytes past the entry list");
    Ok(())
}

#[test]
fn unknown_identifier_in_record_fails() -> TestResult {
    let codec = codec()?;
    let mut bytes = password_file(&codec)?;
    // variable id low byte of the first entry, scrambled
    set_byte(&mut bytes, 538, 99u8.wrapping_add(0x11))?;
    assert_eq!(
        codec.decode(&bytes),
        Err(SetupBinError::UnknownVariableId {
            module_id: 1,
            variable_id: 99
        })
    );
    Ok(())
}

#[test]
fn entry_length_past_record_end_fails() -> TestResult {
    let codec = codec()?;
    let mut bytes = password_file(&codec)?;
    // length field 0x01F0 (496) overruns the 488-byte entry area
    set_byte(&mut bytes, 540, 0xF0u8.wrapping_add(0x11))?;
    set_byte(&mut bytes, 541, 0x01u8.wrapping_add(0x11))?;
    assert!(matches!(
        codec.decode(&bytes),
        Err(SetupBinError::TruncatedValue { .. })
    ));
    Ok(())
}

#[test]
fn fixed_width_length_mismatch_fails() -> TestResult {
    let codec = codec()?;
    let mut bytes = codec.build_from_names([("DHCP", Value::I8(2))])?;
    // declare two bytes for an Int8 value
    set_byte(&mut bytes, 540, 2u8.wrapping_add(0x11))?;
    assert!(matches!(
        codec.decode(&bytes),
        Err(SetupBinError::InvalidValueLength { .. })
    ));
    Ok(())
}

#[test]
fn mismatched_transform_never_yields_values() -> TestResult {
    let registry = registry()?;
    let scrambled = SetupBinCodec::new(Arc::clone(&registry));
    let plain = SetupBinCodec::with_transform(Arc::clone(&registry), IdentityTransform);

    let bytes = password_file(&scrambled)?;
    assert!(plain.decode(&bytes).is_err());

    let bytes = plain.build_from_names([("New MEBx Password", Value::text("HeyH0Password!"))])?;
    assert!(scrambled.decode(&bytes).is_err());
    Ok(())
}
