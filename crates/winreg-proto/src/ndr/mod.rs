//! NDR (Network Data Representation) primitives used by MS-RRP.
//!
//! Every MS-RRP message is a flat NDR stub: little-endian scalars aligned to
//! their natural size relative to the start of the stub, pointers as 4-byte
//! referent ids, and variable-length data framed by conformant or
//! conformant-varying array headers.
//!
//! MS-RRP never transmits two pointers to the same referent, so the codec
//! resolves every pointee in-line: a top-level pointer's referent follows the
//! referent id directly, and the deferred data of an embedded pointer follows
//! the structure that embeds it.
//!
//! Alignment is applied lazily. Writers pad with zeros before a scalar that
//! would otherwise be misaligned; readers skip (and ignore) the same padding.

mod reader;
mod string;
mod writer;

use bytes::Bytes;
pub use reader::{NdrReader, VaryingHeader};
pub use string::StringBuffer;
pub(crate) use writer::wire_count;
pub use writer::{NdrWriter, REFERENT_BASE};

use crate::errors::Result;

/// Bytes of zero padding needed to move `position` to a multiple of
/// `alignment`.
///
/// `alignment` must be non-zero.
pub const fn pad_len(position: usize, alignment: usize) -> usize {
    (alignment - position % alignment) % alignment
}

/// A value with an NDR wire representation.
pub trait NdrEncode {
    /// Append the wire representation of `self`.
    fn encode(&self, writer: &mut NdrWriter) -> Result<()>;

    /// Encode `self` as a standalone stub.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut writer = NdrWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.finish())
    }
}

/// A value that can be parsed from its NDR wire representation.
pub trait NdrDecode: Sized {
    /// Parse a value at the reader's cursor.
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self>;

    /// Parse a value from the start of `data`.
    ///
    /// Trailing bytes after the value are ignored.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::decode(&mut NdrReader::new(data))
    }

    /// Parse a value starting at `offset` and report how many bytes it
    /// consumed, including any leading alignment padding.
    ///
    /// Alignment is computed relative to the start of `data`.
    fn decode_at(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut reader = NdrReader::at(data, offset);
        let value = Self::decode(&mut reader)?;
        Ok((value, reader.position() - offset))
    }
}

impl NdrEncode for u8 {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u8(*self);
        Ok(())
    }
}

impl NdrDecode for u8 {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.read_u8()
    }
}

impl NdrEncode for u16 {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u16(*self);
        Ok(())
    }
}

impl NdrDecode for u16 {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.read_u16()
    }
}

impl NdrEncode for u32 {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u32(*self);
        Ok(())
    }
}

impl NdrDecode for u32 {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.read_u32()
    }
}
