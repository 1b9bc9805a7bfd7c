//! Stub serializer.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{Immutable, IntoBytes};

use super::{NdrEncode, pad_len};
use crate::errors::{ProtocolError, Result};

/// First referent id handed out for non-null pointers.
///
/// Windows stubs number referents from `0x00020000` upwards in steps of four;
/// servers only look at whether the id is zero.
pub const REFERENT_BASE: u32 = 0x0002_0000;

/// Append-only NDR serializer.
#[derive(Debug)]
pub struct NdrWriter {
    buf: BytesMut,
    next_referent: u32,
}

impl Default for NdrWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl NdrWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buf: BytesMut::new(), next_referent: REFERENT_BASE }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Pad with zeros up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let pad = pad_len(self.buf.len(), alignment);
        self.buf.put_bytes(0, pad);
    }

    /// Write a single byte (no alignment).
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a 2-byte aligned little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.align(2);
        self.buf.put_u16_le(value);
    }

    /// Write a 4-byte aligned little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.align(4);
        self.buf.put_u32_le(value);
    }

    /// Write raw bytes with no framing and no alignment.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write the in-memory representation of a fixed-layout structure.
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) {
        self.buf.put_slice(value.as_bytes());
    }

    /// Write UTF-16 code units back to back.
    pub fn write_utf16(&mut self, units: &[u16]) {
        self.align(2);
        for unit in units {
            self.buf.put_u16_le(*unit);
        }
    }

    /// Write a referent id: zero for null, a fresh non-zero id otherwise.
    pub fn write_referent(&mut self, present: bool) {
        if present {
            let referent = self.next_referent;
            self.next_referent = self.next_referent.checked_add(4).unwrap_or(REFERENT_BASE);
            self.write_u32(referent);
        } else {
            self.write_u32(0);
        }
    }

    /// Write a unique pointer and, when present, its referent in-line.
    pub fn write_pointer<T: NdrEncode + ?Sized>(&mut self, value: Option<&T>) -> Result<()> {
        self.write_referent(value.is_some());
        match value {
            Some(value) => value.encode(self),
            None => Ok(()),
        }
    }

    /// Write a conformant byte array: element count, then the bytes.
    pub fn write_conformant_bytes(&mut self, data: &[u8]) -> Result<()> {
        let count = wire_count(data.len())?;
        self.write_u32(count);
        self.write_fixed(data);
        Ok(())
    }

    /// Write a conformant-varying byte array.
    ///
    /// The maximum count is raised to the payload length if smaller, so the
    /// header is always self-consistent.
    pub fn write_varying_bytes(&mut self, max_count: u32, data: &[u8]) -> Result<()> {
        let count = wire_count(data.len())?;
        self.write_u32(max_count.max(count));
        self.write_u32(0);
        self.write_u32(count);
        self.write_fixed(data);
        Ok(())
    }

    /// Freeze the stub.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Convert a length to a 32-bit wire element count.
pub(crate) fn wire_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ProtocolError::ArrayTooLong { len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referents_are_distinct_and_non_zero() {
        let mut writer = NdrWriter::new();
        writer.write_referent(true);
        writer.write_referent(false);
        writer.write_referent(true);
        let bytes = writer.finish();

        assert_eq!(&bytes[0..4], &REFERENT_BASE.to_le_bytes());
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &(REFERENT_BASE + 4).to_le_bytes());
    }

    #[test]
    fn scalars_are_padded_to_natural_alignment() {
        let mut writer = NdrWriter::new();
        writer.write_u8(0x01);
        writer.write_u16(0x0302);
        writer.write_u32(0x0706_0504);
        assert_eq!(writer.finish().as_ref(), &[0x01, 0x00, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
    }

    #[test]
    fn conformant_array_is_count_then_payload() {
        let mut writer = NdrWriter::new();
        writer.write_conformant_bytes(&[1, 0, 0, 0]).unwrap();
        writer.write_u32(4);
        assert_eq!(writer.finish().as_ref(), &[4, 0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0]);
    }

    #[test]
    fn varying_array_pads_before_next_scalar() {
        let mut writer = NdrWriter::new();
        writer.write_varying_bytes(8, &[0xaa, 0xbb, 0xcc]).unwrap();
        writer.write_u32(0xffff_ffff);
        let bytes = writer.finish();

        assert_eq!(&bytes[0..12], &[8, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0xaa, 0xbb, 0xcc, 0x00]);
        assert_eq!(&bytes[16..20], &[0xff; 4]);
    }

    #[test]
    fn varying_array_maximum_never_below_actual() {
        let mut writer = NdrWriter::new();
        writer.write_varying_bytes(1, &[1, 2, 3]).unwrap();
        assert_eq!(&writer.finish()[0..4], &[3, 0, 0, 0]);
    }
}
