//! Convenience re-exports for common Setup.bin types

pub use crate::certificate::{CertificateField, CertificateSpec, HashAlgorithm};
pub use crate::container::{
    DO_NOT_CONSUME, Record, RecordFlags, RecordType, SUPPORTED_FILE_TYPE, SetupBinCodec,
    SetupBinContainer,
};
pub use crate::error::{SetupBinError, SetupBinResult};
pub use crate::registry::VariableRegistry;
pub use crate::scramble::{ByteScrambler, IdentityTransform, IntegrityTransform};
pub use crate::types::{Domain, Value, VariableDefinition, VariableEntry, VariableType};
