//! Core value and definition types for Setup.bin variables

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{SetupBinError, SetupBinResult};

/// Closed set of variable types, keyed by their wire type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum VariableType {
    String = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    #[serde(rename = "GUID")]
    Guid = 4,
}

impl VariableType {
    pub const ALL: [VariableType; 5] = [
        VariableType::String,
        VariableType::Int8,
        VariableType::Int16,
        VariableType::Int32,
        VariableType::Guid,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::String),
            1 => Some(Self::Int8),
            2 => Some(Self::Int16),
            3 => Some(Self::Int32),
            4 => Some(Self::Guid),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Encoded width for fixed-size types, `None` for String.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::String => None,
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 => Some(4),
            Self::Guid => Some(16),
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Guid => "GUID",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed variable value.
///
/// Text is kept as raw bytes because some String variables (the certificate
/// descriptor) carry binary payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(Vec<u8>),
    I8(i8),
    I16(i16),
    I32(i32),
    Guid(Uuid),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into().into_bytes())
    }

    /// Parse a GUID from its canonical 8-4-4-4-12 hexadecimal form.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::MalformedGuid`] for any other shape.
    pub fn guid(text: &str) -> SetupBinResult<Self> {
        parse_canonical_guid(text).map(Self::Guid)
    }

    pub fn variable_type(&self) -> VariableType {
        match self {
            Self::Text(_) => VariableType::String,
            Self::I8(_) => VariableType::Int8,
            Self::I16(_) => VariableType::Int16,
            Self::I32(_) => VariableType::Int32,
            Self::Guid(_) => VariableType::Guid,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::I8(v) => Some(i32::from(*v)),
            Self::I16(v) => Some(i32::from(*v)),
            Self::I32(v) => Some(*v),
            Self::Text(_) | Self::Guid(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Text value as UTF-8, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Build an integer value of the given width, range-checked.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::InvalidLiteral`] if `ty` is not an integer
    /// type or `value` does not fit it.
    pub fn from_integer(ty: VariableType, value: i64) -> SetupBinResult<Self> {
        let invalid = || SetupBinError::InvalidLiteral {
            ty,
            input: value.to_string(),
        };
        match ty {
            VariableType::Int8 => i8::try_from(value).ok().map(Self::I8).ok_or_else(invalid),
            VariableType::Int16 => i16::try_from(value).ok().map(Self::I16).ok_or_else(invalid),
            VariableType::Int32 => i32::try_from(value).ok().map(Self::I32).ok_or_else(invalid),
            VariableType::String | VariableType::Guid => Err(invalid()),
        }
    }

    /// Convert a textual literal (command line, profile file) to a value of `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::InvalidLiteral`] for unparsable integers and
    /// [`SetupBinError::MalformedGuid`] for non-canonical GUIDs.
    pub fn parse(ty: VariableType, input: &str) -> SetupBinResult<Self> {
        match ty {
            VariableType::String => Ok(Self::text(input)),
            VariableType::Guid => Self::guid(input.trim()),
            VariableType::Int8 | VariableType::Int16 | VariableType::Int32 => {
                let parsed = input.trim().parse::<i64>().ok().ok_or_else(|| {
                    SetupBinError::InvalidLiteral {
                        ty,
                        input: input.to_string(),
                    }
                })?;
                Self::from_integer(ty, parsed)
            }
        }
    }
}

fn parse_canonical_guid(text: &str) -> SetupBinResult<Uuid> {
    let bytes = text.as_bytes();
    let canonical = bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        });
    if !canonical {
        return Err(SetupBinError::MalformedGuid(text.to_string()));
    }
    Uuid::parse_str(text).map_err(|e| SetupBinError::MalformedGuid(format!("{text}: {e}")))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(text),
                Err(_) => write!(f, "0x{}", hex::encode(bytes)),
            },
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::Guid(guid) => write!(f, "{guid:X}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => {
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry("hex", &hex::encode(bytes))?;
                    map.end()
                }
            },
            Self::I8(v) => serializer.serialize_i8(*v),
            Self::I16(v) => serializer.serialize_i16(*v),
            Self::I32(v) => serializer.serialize_i32(*v),
            Self::Guid(guid) => serializer.collect_str(&format_args!("{guid:X}")),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Text(bytes)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<Uuid> for Value {
    fn from(guid: Uuid) -> Self {
        Self::Guid(guid)
    }
}

/// Constraint on the legal values of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Integer variable restricted to the listed codes.
    Choices(BTreeMap<i32, String>),
    /// String variable limited to this many bytes.
    MaxLength(usize),
}

impl Domain {
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        Self::Choices(
            choices
                .into_iter()
                .map(|(code, label)| (code, label.into()))
                .collect(),
        )
    }

    /// Check `value` against the constraint, returning a human-readable reason on rejection.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when `value` falls outside the domain.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::Choices(choices) => match value.as_integer() {
                Some(code) if choices.contains_key(&code) => Ok(()),
                Some(code) => {
                    let allowed: Vec<String> = choices.keys().map(i32::to_string).collect();
                    Err(format!("{code} is not one of [{}]", allowed.join(", ")))
                }
                None => Err("expected an integer value".to_string()),
            },
            Self::MaxLength(max) => match value.as_bytes() {
                Some(bytes) if bytes.len() <= *max => Ok(()),
                Some(bytes) => Err(format!(
                    "{} bytes exceeds maximum of {max}",
                    bytes.len()
                )),
                None => Err("expected a text value".to_string()),
            },
        }
    }

    /// Label for an integer value when the domain enumerates choices.
    pub fn describe(&self, value: &Value) -> Option<&str> {
        match self {
            Self::Choices(choices) => value
                .as_integer()
                .and_then(|code| choices.get(&code))
                .map(String::as_str),
            Self::MaxLength(_) => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choices(choices) => {
                let parts: Vec<String> = choices
                    .iter()
                    .map(|(code, label)| format!("{code}={label}"))
                    .collect();
                write!(f, "{}", parts.join(", "))
            }
            Self::MaxLength(max) => write!(f, "max {max} bytes"),
        }
    }
}

/// Registry entry describing one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    name: String,
    module_id: u16,
    variable_id: u16,
    #[serde(rename = "type")]
    variable_type: VariableType,
    domain: Option<Domain>,
}

impl VariableDefinition {
    pub(crate) fn new(
        name: String,
        module_id: u16,
        variable_id: u16,
        variable_type: VariableType,
        domain: Option<Domain>,
    ) -> Self {
        Self {
            name,
            module_id,
            variable_id,
            variable_type,
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_id(&self) -> u16 {
        self.module_id
    }

    pub fn variable_id(&self) -> u16 {
        self.variable_id
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    /// Check that `value` has this variable's type and satisfies its domain.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::TypeMismatch`] or [`SetupBinError::DomainViolation`].
    pub fn validate(&self, value: &Value) -> SetupBinResult<()> {
        let actual = value.variable_type();
        if actual != self.variable_type {
            return Err(SetupBinError::TypeMismatch {
                name: self.name.clone(),
                expected: self.variable_type,
                actual,
            });
        }
        if let Some(domain) = &self.domain {
            domain
                .check(value)
                .map_err(|reason| SetupBinError::DomainViolation {
                    name: self.name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

/// A validated (variable, value) pair inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableEntry {
    name: String,
    module_id: u16,
    variable_id: u16,
    value: Value,
}

impl VariableEntry {
    /// Bind `value` to `definition` after type and domain validation.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::TypeMismatch`] or [`SetupBinError::DomainViolation`].
    pub fn new(definition: &VariableDefinition, value: Value) -> SetupBinResult<Self> {
        definition.validate(&value)?;
        Ok(Self {
            name: definition.name.clone(),
            module_id: definition.module_id,
            variable_id: definition.variable_id,
            value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_id(&self) -> u16 {
        self.module_id
    }

    pub fn variable_id(&self) -> u16 {
        self.variable_id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_pair(self) -> (String, Value) {
        (self.name, self.value)
    }
}
