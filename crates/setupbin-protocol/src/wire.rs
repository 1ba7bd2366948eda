//! Little-endian cursor helpers for the Setup.bin wire format

use crate::error::{SetupBinError, SetupBinResult};

/// Forward-only reader over a borrowed byte slice.
pub struct WireReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        self.buffer.get(self.position..).unwrap_or_default()
    }

    pub fn read_bytes(&mut self, count: usize) -> SetupBinResult<&'a [u8]> {
        let end = self.position.checked_add(count);
        let slice = end.and_then(|end| self.buffer.get(self.position..end));
        match (slice, end) {
            (Some(slice), Some(end)) => {
                self.position = end;
                Ok(slice)
            }
            _ => Err(SetupBinError::TruncatedFile {
                expected: self.position.saturating_add(count),
                actual: self.buffer.len(),
            }),
        }
    }

    pub fn read_array<const N: usize>(&mut self) -> SetupBinResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> SetupBinResult<u8> {
        self.read_array::<1>().map(u8::from_le_bytes)
    }

    pub fn read_u16_le(&mut self) -> SetupBinResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> SetupBinResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn skip(&mut self, count: usize) -> SetupBinResult<()> {
        self.read_bytes(count).map(|_| ())
    }
}

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u32_le(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    /// Zero-fill until the length is a multiple of `alignment`.
    pub fn pad_to_multiple(&mut self, alignment: usize) -> &mut Self {
        if alignment > 0 {
            let target = self.buffer.len().div_ceil(alignment).saturating_mul(alignment);
            self.buffer.resize(target, 0);
        }
        self
    }

    /// Zero-fill up to exactly `len` bytes; never truncates.
    pub fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.buffer.len() < len {
            self.buffer.resize(len, 0);
        }
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
