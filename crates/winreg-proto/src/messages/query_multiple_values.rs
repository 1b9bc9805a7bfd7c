//! `BaseRegQueryMultipleValues` (opnum 29).
//!
//! Reads several values of one key in a single round trip. The request names
//! the values in an RVALENT array; the response fills in each entry's type,
//! length and offset into one shared buffer.
//!
//! ```text
//! request:
//!   hKey
//!   conformant-varying RVALENT[num_vals]      ptr name | u32 len | u32 offset | u32 type
//!     -- deferred names, in entry order
//!   u32 num_vals
//!   ptr -> conformant-varying u8[total]       lpvalueBuf
//!   u32 total                                 ldwTotsize
//! response:
//!   conformant-varying RVALENT[num_vals] (+ deferred names)
//!   ptr -> conformant-varying u8[total] | u32 total | u32 return code
//! ```

use super::{RrpRequest, RrpResponse};
use crate::{
    errors::{ProtocolError, Result},
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode, ValueType},
};

/// Wire size of one RVALENT before its deferred name.
const ENTRY_SIZE: usize = 16;

/// One RVALENT: a value name and where its data sits in the shared buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueEntry {
    /// Value name.
    pub name: String,
    /// Data length in bytes.
    pub len: u32,
    /// Data offset into the response buffer.
    pub offset: u32,
    /// Value type.
    pub value_type: ValueType,
}

impl ValueEntry {
    /// Request-side entry for `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

fn encode_entries(entries: &[ValueEntry], writer: &mut NdrWriter) -> Result<()> {
    let count = crate::ndr::wire_count(entries.len())?;
    writer.write_u32(count);
    writer.write_u32(0);
    writer.write_u32(count);
    for entry in entries {
        writer.write_referent(true);
        writer.write_u32(entry.len);
        writer.write_u32(entry.offset);
        entry.value_type.encode(writer)?;
    }
    for entry in entries {
        entry.name.encode(writer)?;
    }
    Ok(())
}

fn decode_entries(reader: &mut NdrReader<'_>) -> Result<Vec<ValueEntry>> {
    let header = reader.read_varying_header(ENTRY_SIZE)?;
    let mut slots = Vec::with_capacity(header.actual_count as usize);
    for _ in 0..header.actual_count {
        let referent_offset = reader.position();
        let referent = reader.read_referent()?;
        let len = reader.read_u32()?;
        let offset = reader.read_u32()?;
        let value_type = ValueType::decode(reader)?;
        slots.push((referent.map(|id| (referent_offset, id)), len, offset, value_type));
    }

    slots
        .into_iter()
        .map(|(referent, len, offset, value_type)| {
            let name = match referent {
                Some((referent_offset, id)) => {
                    reader.expect_referent_payload(referent_offset, id)?;
                    String::decode(reader)?
                },
                None => String::new(),
            };
            Ok(ValueEntry { name, len, offset, value_type })
        })
        .collect()
}

/// Read several values of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMultipleValuesRequest {
    /// Key holding the values.
    pub key_handle: KeyHandle,
    /// Values to read.
    pub entries: Vec<ValueEntry>,
    /// Zero-filled receive buffer; `None` to ask only for the size needed.
    pub buffer: Option<Vec<u8>>,
    /// Receive buffer size in bytes.
    pub total_size: u32,
}

impl QueryMultipleValuesRequest {
    /// Read `names` into a `buffer_size`-byte buffer.
    pub fn new<I, S>(key_handle: KeyHandle, names: I, buffer_size: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_handle,
            entries: names.into_iter().map(ValueEntry::named).collect(),
            buffer: (buffer_size != 0).then(|| vec![0; buffer_size as usize]),
            total_size: buffer_size,
        }
    }
}

impl NdrEncode for QueryMultipleValuesRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        encode_entries(&self.entries, writer)?;
        writer.write_u32(crate::ndr::wire_count(self.entries.len())?);
        writer.write_referent(self.buffer.is_some());
        if let Some(buffer) = &self.buffer {
            writer.write_varying_bytes(self.total_size, buffer)?;
        }
        writer.write_u32(self.total_size);
        Ok(())
    }
}

fn decode_buffer(reader: &mut NdrReader<'_>) -> Result<Option<Vec<u8>>> {
    reader.align(4)?;
    let referent_offset = reader.position();
    match reader.read_referent()? {
        Some(referent) => {
            reader.expect_referent_payload(referent_offset, referent)?;
            Ok(Some(reader.read_varying_bytes()?.1))
        },
        None => Ok(None),
    }
}

impl NdrDecode for QueryMultipleValuesRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let entries = decode_entries(reader)?;
        let _num_vals = reader.read_u32()?;
        let buffer = decode_buffer(reader)?;
        let total_size = reader.read_u32()?;
        Ok(Self { key_handle, entries, buffer, total_size })
    }
}

impl RrpRequest for QueryMultipleValuesRequest {
    const OPNUM: Opnum = Opnum::BaseRegQueryMultipleValues;
    type Response = QueryMultipleValuesResponse;
}

/// Filled-in entries and the shared data buffer.
///
/// On `ERROR_MORE_DATA`, `total_size` is the buffer size the values need.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryMultipleValuesResponse {
    /// One entry per requested value, in request order.
    pub entries: Vec<ValueEntry>,
    /// Shared buffer holding every value's bytes.
    pub buffer: Option<Vec<u8>>,
    /// Bytes used, or needed.
    pub total_size: u32,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl QueryMultipleValuesResponse {
    /// Pair each entry with its slice of the shared buffer.
    ///
    /// Fails with `MalformedArray` if an entry points outside the buffer.
    pub fn values(&self) -> Result<Vec<(&ValueEntry, &[u8])>> {
        let buffer = self.buffer.as_deref().unwrap_or_default();
        self.entries
            .iter()
            .map(|entry| {
                let start = entry.offset as usize;
                let slice = start
                    .checked_add(entry.len as usize)
                    .and_then(|end| buffer.get(start..end))
                    .ok_or(ProtocolError::MalformedArray {
                        offset: start,
                        reason: "value entry outside the returned buffer",
                    })?;
                Ok((entry, slice))
            })
            .collect()
    }
}

impl NdrEncode for QueryMultipleValuesResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        encode_entries(&self.entries, writer)?;
        writer.write_referent(self.buffer.is_some());
        if let Some(buffer) = &self.buffer {
            writer.write_varying_bytes(self.total_size, buffer)?;
        }
        writer.write_u32(self.total_size);
        self.return_code.encode(writer)
    }
}

impl NdrDecode for QueryMultipleValuesResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let entries = decode_entries(reader)?;
        let buffer = decode_buffer(reader)?;
        let total_size = reader.read_u32()?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { entries, buffer, total_size, return_code })
    }
}

impl RrpResponse for QueryMultipleValuesResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn request_layout() {
        let request = QueryMultipleValuesRequest::new(KeyHandle::default(), ["a", "b"], 4);
        let bytes = request.to_bytes().unwrap();
        assert_eq!(
            &bytes[20..],
            hex!(
                "02000000 00000000 02000000"
                "00000200 00000000 00000000 00000000"
                "04000200 00000000 00000000 00000000"
                "04000400 08000200 02000000 00000000 02000000 61000000"
                "04000400 0c000200 02000000 00000000 02000000 62000000"
                "02000000"
                "10000200 04000000 00000000 04000000 00000000"
                "04000000"
            )
        );
        assert_eq!(QueryMultipleValuesRequest::from_bytes(&bytes).unwrap(), request);
    }

    #[test]
    fn response_values_slice_the_buffer() {
        let response = QueryMultipleValuesResponse {
            entries: vec![
                ValueEntry { name: "a".into(), len: 4, offset: 0, value_type: ValueType::Dword },
                ValueEntry { name: "b".into(), len: 2, offset: 4, value_type: ValueType::Binary },
            ],
            buffer: Some(vec![1, 0, 0, 0, 0xaa, 0xbb]),
            total_size: 6,
            return_code: ReturnCode::SUCCESS,
        };
        let decoded = QueryMultipleValuesResponse::from_bytes(&response.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, response);

        let values = decoded.values().unwrap();
        assert_eq!(values[0].1, [1, 0, 0, 0]);
        assert_eq!(values[1].0.name, "b");
        assert_eq!(values[1].1, [0xaa, 0xbb]);
    }

    #[test]
    fn entry_outside_buffer_is_malformed() {
        let response = QueryMultipleValuesResponse {
            entries: vec![ValueEntry { name: "a".into(), len: 8, offset: 2, ..ValueEntry::default() }],
            buffer: Some(vec![0; 4]),
            total_size: 4,
            return_code: ReturnCode::SUCCESS,
        };
        assert!(matches!(response.values(), Err(ProtocolError::MalformedArray { offset: 2, .. })));
    }

    #[test]
    fn entry_count_beyond_input_rejected() {
        let data = hex!("ffff0000 00000000 ffff0000 00000000");
        assert!(matches!(
            QueryMultipleValuesResponse::from_bytes(&data),
            Err(ProtocolError::MalformedArray { .. })
        ));
    }
}
