//! RRP_UNICODE_STRING and its output-buffer form.
//!
//! ```text
//! u16 Length          bytes, including the NUL terminator
//! u16 MaximumLength   equal to Length on well-formed input strings
//! u32 referent id     0 for the empty string
//! -- deferred, when the referent is non-null --
//! u32 max count, u32 offset (0), u32 actual count
//! actual count x u16  UTF-16LE, last unit is NUL
//! ```

use std::iter;

use super::{NdrDecode, NdrEncode, NdrReader, NdrWriter};
use crate::errors::{ProtocolError, Result};

impl NdrEncode for str {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.align(4);
        if self.is_empty() {
            writer.write_u16(0);
            writer.write_u16(0);
            writer.write_referent(false);
            return Ok(());
        }

        let units: Vec<u16> = self.encode_utf16().chain(iter::once(0)).collect();
        let byte_len = units
            .len()
            .checked_mul(2)
            .and_then(|len| u16::try_from(len).ok())
            .ok_or(ProtocolError::StringTooLong { chars: units.len() })?;
        let count = u32::from(byte_len / 2);

        writer.write_u16(byte_len);
        writer.write_u16(byte_len);
        writer.write_referent(true);
        writer.write_u32(count);
        writer.write_u32(0);
        writer.write_u32(count);
        writer.write_utf16(&units);
        Ok(())
    }
}

impl NdrEncode for String {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.as_str().encode(writer)
    }
}

impl NdrDecode for String {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.align(4)?;
        let offset = reader.position();
        let length = reader.read_u16()?;
        let maximum_length = reader.read_u16()?;
        if length > maximum_length {
            return Err(ProtocolError::MalformedString {
                offset,
                reason: "length exceeds maximum length",
            });
        }
        if length % 2 != 0 {
            return Err(ProtocolError::MalformedString { offset, reason: "odd byte length" });
        }

        let referent_offset = reader.position();
        let Some(referent) = reader.read_referent()? else {
            if length != 0 {
                return Err(ProtocolError::MalformedString {
                    offset,
                    reason: "non-zero length with null buffer",
                });
            }
            return Ok(Self::new());
        };
        reader.expect_referent_payload(referent_offset, referent)?;

        let header = reader.read_varying_header(2)?;
        let units = reader.read_utf16(header.actual_count as usize)?;
        let text = match units.split_last() {
            Some((0, rest)) => rest,
            _ => units.as_slice(),
        };
        Self::from_utf16(text)
            .map_err(|_| ProtocolError::MalformedString { offset, reason: "invalid UTF-16" })
    }
}

/// Caller-supplied capacity for a string the server fills in.
///
/// Sent as an RRP_UNICODE_STRING with `Length = 0`, `MaximumLength` set to
/// the capacity in bytes, and an empty conformant-varying array sized for
/// that capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringBuffer {
    capacity: u16,
}

impl StringBuffer {
    /// Buffer able to hold `bytes` bytes of UTF-16 (rounded down to whole
    /// code units).
    pub const fn with_capacity(bytes: u16) -> Self {
        Self { capacity: bytes & !1 }
    }

    /// Capacity in bytes.
    pub const fn capacity(self) -> u16 {
        self.capacity
    }
}

impl NdrEncode for StringBuffer {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.align(4);
        writer.write_u16(0);
        writer.write_u16(self.capacity);
        writer.write_referent(self.capacity != 0);
        if self.capacity != 0 {
            writer.write_u32(u32::from(self.capacity / 2));
            writer.write_u32(0);
            writer.write_u32(0);
        }
        Ok(())
    }
}

impl NdrDecode for StringBuffer {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.align(4)?;
        let offset = reader.position();
        let length = reader.read_u16()?;
        let maximum_length = reader.read_u16()?;
        if length > maximum_length {
            return Err(ProtocolError::MalformedString {
                offset,
                reason: "length exceeds maximum length",
            });
        }

        let referent_offset = reader.position();
        if let Some(referent) = reader.read_referent()? {
            reader.expect_referent_payload(referent_offset, referent)?;
            let header = reader.read_varying_header(2)?;
            reader.read_utf16(header.actual_count as usize)?;
        }
        Ok(Self::with_capacity(maximum_length))
    }
}
