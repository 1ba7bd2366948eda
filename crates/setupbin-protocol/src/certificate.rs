//! Packing of trusted root certificate hashes for the
//! "User Defined Certificate Addition" variable
//!
//! The payload is `[algorithm tag][digest][name length][name]`. Only SHA-256
//! digests are produced, but all three declared algorithms can be read back.

use regex::Regex;
use serde::Serialize;

use crate::error::{SetupBinError, SetupBinResult};

/// Longest certificate friendly name the field accepts, in bytes.
pub const MAX_NAME_LEN: usize = 32;

const SPEC_PATTERN: &str = r"^(?<hash>[a-fA-F0-9]{64}) (?<name>.+)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum HashAlgorithm {
    Sha1 = 1,
    Sha256 = 2,
    Sha384 = 3,
}

impl HashAlgorithm {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            3 => Some(Self::Sha384),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
        }
    }
}

/// Pack a SHA-256 hash and friendly name into the certificate field payload.
///
/// # Errors
///
/// - [`SetupBinError::InvalidCertificateHash`] unless `hash_hex` is exactly
///   64 hexadecimal characters
/// - [`SetupBinError::NameTooLong`] if `name` exceeds [`MAX_NAME_LEN`] bytes
pub fn pack(hash_hex: &str, name: &str) -> SetupBinResult<Vec<u8>> {
    let algorithm = HashAlgorithm::Sha256;
    if hash_hex.len() != algorithm.digest_len() * 2
        || !hash_hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(SetupBinError::InvalidCertificateHash(hash_hex.to_string()));
    }
    let digest = hex::decode(hash_hex)
        .map_err(|e| SetupBinError::InvalidCertificateHash(format!("{hash_hex}: {e}")))?;

    let name_len = u8::try_from(name.len())
        .ok()
        .filter(|len| usize::from(*len) <= MAX_NAME_LEN)
        .ok_or(SetupBinError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        })?;

    let mut out = Vec::with_capacity(2 + digest.len() + name.len());
    out.push(algorithm.tag());
    out.extend_from_slice(&digest);
    out.push(name_len);
    out.extend_from_slice(name.as_bytes());
    Ok(out)
}

/// Parsed `"<sha256-hex> <name>"` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSpec {
    hash_hex: String,
    name: String,
}

impl CertificateSpec {
    /// # Errors
    ///
    /// Returns [`SetupBinError::MalformedCertificateSpec`] when `spec` is not
    /// a 64-character hex hash, one space, and a non-empty name.
    pub fn parse(spec: &str) -> SetupBinResult<Self> {
        let pattern = Regex::new(SPEC_PATTERN)
            .map_err(|e| SetupBinError::MalformedCertificateSpec(e.to_string()))?;
        let captures = pattern
            .captures(spec)
            .ok_or_else(|| SetupBinError::MalformedCertificateSpec(spec.to_string()))?;
        match (captures.name("hash"), captures.name("name")) {
            (Some(hash), Some(name)) => Ok(Self {
                hash_hex: hash.as_str().to_string(),
                name: name.as_str().to_string(),
            }),
            _ => Err(SetupBinError::MalformedCertificateSpec(spec.to_string())),
        }
    }

    pub fn hash_hex(&self) -> &str {
        &self.hash_hex
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// See [`pack`].
    pub fn pack(&self) -> SetupBinResult<Vec<u8>> {
        pack(&self.hash_hex, &self.name)
    }
}

/// A certificate field read back from a decoded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateField {
    pub algorithm: HashAlgorithm,
    pub hash: String,
    pub name: String,
}

impl CertificateField {
    /// Parse a packed payload of any declared algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::InvalidCertificateHash`] for an unknown tag or
    /// short digest and [`SetupBinError::NameTooLong`] / truncation errors for
    /// a bad name section.
    pub fn unpack(bytes: &[u8]) -> SetupBinResult<Self> {
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| SetupBinError::InvalidCertificateHash("empty field".to_string()))?;
        let algorithm = HashAlgorithm::from_tag(tag).ok_or_else(|| {
            SetupBinError::InvalidCertificateHash(format!("unknown algorithm tag {tag}"))
        })?;
        let (digest, rest) = rest
            .split_at_checked(algorithm.digest_len())
            .ok_or_else(|| SetupBinError::InvalidCertificateHash("digest truncated".to_string()))?;
        let (&name_len, name) = rest.split_first().ok_or(SetupBinError::TruncatedFile {
            expected: 2 + algorithm.digest_len(),
            actual: bytes.len(),
        })?;
        let name_len = usize::from(name_len);
        if name_len > MAX_NAME_LEN {
            return Err(SetupBinError::NameTooLong {
                len: name_len,
                max: MAX_NAME_LEN,
            });
        }
        if name.len() != name_len {
            return Err(SetupBinError::TruncatedFile {
                expected: 2 + algorithm.digest_len() + name_len,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algorithm,
            hash: hex::encode(digest),
            name: String::from_utf8_lossy(name).into_owned(),
        })
    }
}
