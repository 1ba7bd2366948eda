//! Per-type value serialization
//!
//! Integers are fixed-width two's-complement little-endian. GUIDs use the
//! mixed-endian layout found in firmware tables: the first three groups are
//! stored little-endian, the trailing eight bytes as written. Strings are raw
//! bytes with no terminator; their length lives in the entry header.

use uuid::Uuid;

use crate::error::{SetupBinError, SetupBinResult};
use crate::types::{Value, VariableType};

/// Serialize `value` as a `ty` field.
///
/// # Errors
///
/// Returns [`SetupBinError::TypeMismatch`] when the value's tag differs from `ty`.
pub fn encode_value(ty: VariableType, value: &Value) -> SetupBinResult<Vec<u8>> {
    match (ty, value) {
        (VariableType::String, Value::Text(bytes)) => Ok(bytes.clone()),
        (VariableType::Int8, Value::I8(v)) => Ok(v.to_le_bytes().to_vec()),
        (VariableType::Int16, Value::I16(v)) => Ok(v.to_le_bytes().to_vec()),
        (VariableType::Int32, Value::I32(v)) => Ok(v.to_le_bytes().to_vec()),
        (VariableType::Guid, Value::Guid(guid)) => Ok(guid.to_bytes_le().to_vec()),
        (expected, other) => Err(SetupBinError::TypeMismatch {
            name: "value".to_string(),
            expected,
            actual: other.variable_type(),
        }),
    }
}

/// Deserialize a `ty` field from exactly `bytes`.
///
/// # Errors
///
/// Returns [`SetupBinError::TruncatedValue`] when a fixed-width field is
/// short and [`SetupBinError::InvalidValueLength`] when it is long.
pub fn decode_value(ty: VariableType, bytes: &[u8]) -> SetupBinResult<Value> {
    match ty {
        VariableType::String => Ok(Value::Text(bytes.to_vec())),
        VariableType::Int8 => fixed::<1>(ty, bytes).map(|b| Value::I8(i8::from_le_bytes(b))),
        VariableType::Int16 => fixed::<2>(ty, bytes).map(|b| Value::I16(i16::from_le_bytes(b))),
        VariableType::Int32 => fixed::<4>(ty, bytes).map(|b| Value::I32(i32::from_le_bytes(b))),
        VariableType::Guid => fixed::<16>(ty, bytes).map(|b| Value::Guid(Uuid::from_bytes_le(b))),
    }
}

fn fixed<const N: usize>(ty: VariableType, bytes: &[u8]) -> SetupBinResult<[u8; N]> {
    if bytes.len() < N {
        return Err(SetupBinError::TruncatedValue {
            ty,
            expected: N,
            actual: bytes.len(),
        });
    }
    <[u8; N]>::try_from(bytes)
        .ok()
        .ok_or(SetupBinError::InvalidValueLength {
            ty,
            expected: N,
            actual: bytes.len(),
        })
}
