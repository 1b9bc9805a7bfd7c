//! Stub parser.

use zerocopy::FromBytes;

use super::{NdrDecode, pad_len};
use crate::errors::{ProtocolError, Result};

/// Header of a conformant-varying array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaryingHeader {
    /// Declared capacity in elements.
    pub max_count: u32,
    /// Elements actually transmitted.
    pub actual_count: u32,
}

/// Cursor over an NDR stub.
///
/// Positions are absolute offsets into the underlying buffer, so alignment is
/// always computed relative to the start of the stub.
#[derive(Debug, Clone)]
pub struct NdrReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NdrReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `offset` into `data`.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    /// Current absolute offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Consume exactly `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let start = self.pos;
        let slice = start.checked_add(len).and_then(|end| data.get(start..end)).ok_or(
            ProtocolError::TruncatedInput { offset: start, needed: len, available: self.remaining() },
        )?;
        self.pos += len;
        Ok(slice)
    }

    /// Skip padding up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let pad = pad_len(self.pos, alignment);
        self.take(pad).map(|_| ())
    }

    /// Read a fixed number of bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a fixed-layout structure byte for byte (no alignment).
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let offset = self.pos;
        let needed = size_of::<T>();
        let raw = self.take(needed)?;
        T::read_from_bytes(raw).map_err(|_| ProtocolError::TruncatedInput {
            offset,
            needed,
            available: raw.len(),
        })
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Read a 2-byte aligned little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.align(2)?;
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a 4-byte aligned little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.align(4)?;
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a referent id, returning `None` for a null pointer.
    pub fn read_referent(&mut self) -> Result<Option<u32>> {
        let referent = self.read_u32()?;
        Ok((referent != 0).then_some(referent))
    }

    /// Read a unique pointer and, when non-null, its in-line referent.
    pub fn read_pointer<T: NdrDecode>(&mut self) -> Result<Option<T>> {
        self.align(4)?;
        let offset = self.pos;
        let Some(referent) = self.read_referent()? else {
            return Ok(None);
        };
        self.expect_referent_payload(offset, referent)?;
        T::decode(self).map(Some)
    }

    /// Fail with `MalformedPointer` when a non-null referent has nothing
    /// after it.
    pub fn expect_referent_payload(&self, offset: usize, referent: u32) -> Result<()> {
        if self.remaining() == 0 {
            return Err(ProtocolError::MalformedPointer { offset, referent });
        }
        Ok(())
    }

    /// Read a conformant byte array.
    pub fn read_conformant_bytes(&mut self) -> Result<Vec<u8>> {
        self.align(4)?;
        let offset = self.pos;
        let count = self.read_u32()? as usize;
        if count > self.remaining() {
            return Err(ProtocolError::MalformedArray {
                offset,
                reason: "element count exceeds remaining input",
            });
        }
        Ok(self.take(count)?.to_vec())
    }

    /// Read and validate a conformant-varying array header whose elements are
    /// `element_size` bytes wide.
    pub fn read_varying_header(&mut self, element_size: usize) -> Result<VaryingHeader> {
        self.align(4)?;
        let offset = self.pos;
        let max_count = self.read_u32()?;
        let first = self.read_u32()?;
        let actual_count = self.read_u32()?;

        if first != 0 {
            return Err(ProtocolError::MalformedArray { offset, reason: "non-zero array offset" });
        }
        if actual_count > max_count {
            return Err(ProtocolError::MalformedArray {
                offset,
                reason: "actual count exceeds maximum count",
            });
        }
        let fits = (actual_count as usize)
            .checked_mul(element_size)
            .is_some_and(|len| len <= self.remaining());
        if !fits {
            return Err(ProtocolError::MalformedArray {
                offset,
                reason: "actual count exceeds remaining input",
            });
        }

        Ok(VaryingHeader { max_count, actual_count })
    }

    /// Read a conformant-varying byte array, returning its header and payload.
    pub fn read_varying_bytes(&mut self) -> Result<(VaryingHeader, Vec<u8>)> {
        let header = self.read_varying_header(1)?;
        let data = self.take(header.actual_count as usize)?.to_vec();
        Ok((header, data))
    }

    /// Read `count` UTF-16 code units.
    pub fn read_utf16(&mut self, count: usize) -> Result<Vec<u16>> {
        self.align(2)?;
        let raw = self.take(count.saturating_mul(2))?;
        Ok(raw.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect())
    }
}
