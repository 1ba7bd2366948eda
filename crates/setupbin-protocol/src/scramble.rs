//! Reversible integrity transforms for record payloads

use std::fmt::Debug;

use crate::error::SetupBinResult;

/// Byte-level transform applied to a record's entry area.
///
/// `invert(apply(x))` must return `x` for every input.
pub trait IntegrityTransform: Debug + Send + Sync {
    fn apply(&self, area: &[u8]) -> Vec<u8>;

    /// # Errors
    ///
    /// Implementations return [`crate::SetupBinError::IntegrityCheckFailed`]
    /// when the input cannot have been produced by [`IntegrityTransform::apply`].
    fn invert(&self, area: &[u8]) -> SetupBinResult<Vec<u8>>;
}

/// Vendor scrambling: each byte is offset by a fixed amount, modulo 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteScrambler {
    offset: u8,
}

impl ByteScrambler {
    pub const VENDOR_OFFSET: u8 = 0x11;

    pub const fn with_offset(offset: u8) -> Self {
        Self { offset }
    }
}

impl Default for ByteScrambler {
    fn default() -> Self {
        Self::with_offset(Self::VENDOR_OFFSET)
    }
}

impl IntegrityTransform for ByteScrambler {
    fn apply(&self, area: &[u8]) -> Vec<u8> {
        area.iter().map(|b| b.wrapping_add(self.offset)).collect()
    }

    fn invert(&self, area: &[u8]) -> SetupBinResult<Vec<u8>> {
        Ok(area.iter().map(|b| b.wrapping_sub(self.offset)).collect())
    }
}

/// Pass-through transform for exercising the framing on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityTransform;

impl IntegrityTransform for IdentityTransform {
    fn apply(&self, area: &[u8]) -> Vec<u8> {
        area.to_vec()
    }

    fn invert(&self, area: &[u8]) -> SetupBinResult<Vec<u8>> {
        Ok(area.to_vec())
    }
}
