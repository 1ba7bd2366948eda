//! Error types for Setup.bin registry and codec operations

use thiserror::Error;

use crate::types::VariableType;

/// Errors raised while building a registry or encoding/decoding a Setup.bin file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupBinError {
    /// Variable name not present in the registry
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// (module, variable) identifier pair not present in the registry
    #[error("Unknown variable: module {module_id} variable {variable_id}")]
    UnknownVariableId { module_id: u16, variable_id: u16 },

    /// Two catalog entries share a name
    #[error("Duplicate variable name in catalog: {0}")]
    DuplicateVariable(String),

    /// Two catalog rows share a (module, variable) identifier pair
    #[error("Duplicate identifier in catalog: module {module_id} variable {variable_id}")]
    DuplicateIdentifier { module_id: u16, variable_id: u16 },

    /// Catalog entry declares a type code outside the closed type set
    #[error("Unknown type code {type_code} for variable {name}")]
    UnknownType { name: String, type_code: u8 },

    /// Catalog entry uses the reserved identifier 0
    #[error("Variable {name} uses reserved identifier {module_id}/{variable_id}")]
    ReservedIdentifier {
        name: String,
        module_id: u16,
        variable_id: u16,
    },

    /// Value tag does not match the declared variable type
    #[error("Type mismatch for {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: VariableType,
        actual: VariableType,
    },

    /// Value rejected by the variable's domain constraint
    #[error("Value out of domain for {name}: {reason}")]
    DomainViolation { name: String, reason: String },

    /// Container format version other than the supported one
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(u8),

    /// Header signature is not one of the known format GUIDs
    #[error("Unknown file signature: {0}")]
    UnknownFileSignature(String),

    /// Header fields disagree with each other or with the body
    #[error("Header mismatch in {field}: expected {expected}, found {actual}")]
    HeaderMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Input ended before a complete structure could be read
    #[error("Truncated file: need {expected} bytes, have {actual}")]
    TruncatedFile { expected: usize, actual: usize },

    /// Number of data records is not exactly one
    #[error("Expected exactly one data record, found {0}")]
    UnexpectedRecordCount(usize),

    /// Record type identifier is not the data record type
    #[error("Invalid record type: {0}")]
    InvalidRecordType(u32),

    /// Record flags other than Valid|Scrambled
    #[error("Unsupported record flags: {0:#06x}")]
    UnsupportedRecordFlags(u32),

    /// Integrity transform or post-inversion validation rejected the record
    #[error("Integrity check failed: {0}")]
    IntegrityCheckFailed(String),

    /// Fixed-width value shorter than its type requires
    #[error("Truncated {ty} value: need {expected} bytes, have {actual}")]
    TruncatedValue {
        ty: VariableType,
        expected: usize,
        actual: usize,
    },

    /// Fixed-width value longer than its type allows
    #[error("Invalid {ty} value length: expected {expected} bytes, have {actual}")]
    InvalidValueLength {
        ty: VariableType,
        expected: usize,
        actual: usize,
    },

    /// Encoded value does not fit the 16-bit entry length field
    #[error("Value for {name} is too large: {len} bytes")]
    ValueTooLarge { name: String, len: usize },

    /// GUID text is not in canonical 8-4-4-4-12 form
    #[error("Malformed GUID: {0}")]
    MalformedGuid(String),

    /// Textual literal cannot be converted to the requested type
    #[error("Invalid {ty} literal: {input}")]
    InvalidLiteral { ty: VariableType, input: String },

    /// Certificate hash is not 64 hexadecimal characters
    #[error("Invalid certificate hash: {0}")]
    InvalidCertificateHash(String),

    /// Certificate name exceeds the field limit
    #[error("Certificate name too long: {len} bytes (max {max})")]
    NameTooLong { len: usize, max: usize },

    /// Combined "<hash> <name>" string does not match the expected shape
    #[error("Malformed certificate spec: {0}")]
    MalformedCertificateSpec(String),
}

/// Result alias for Setup.bin operations
pub type SetupBinResult<T> = std::result::Result<T, SetupBinError>;
