//! `BaseRegEnumValue` (opnum 10).
//!
//! A name buffer like `BaseRegEnumKey`, followed by the same four value
//! pointers `BaseRegQueryValue` uses.

use super::{RrpRequest, RrpResponse, value_slots::ValueSlots};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, StringBuffer},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode, ValueType},
};

/// Fetch the `index`-th value of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueRequest {
    /// Key whose values are enumerated.
    pub key_handle: KeyHandle,
    /// Zero-based value index.
    pub index: u32,
    /// Capacity for the returned value name.
    pub name: StringBuffer,
    /// Type slot.
    pub value_type: Option<ValueType>,
    /// Zero-filled data buffer; `None` to skip the data.
    pub data: Option<Vec<u8>>,
    /// Data buffer capacity.
    pub data_size: Option<u32>,
    /// Bytes transmitted in `data`.
    pub data_len: Option<u32>,
}

impl EnumValueRequest {
    /// Ask for the value at `index` with a `name_capacity`-byte name buffer and
    /// a `data_capacity`-byte data buffer.
    pub fn new(key_handle: KeyHandle, index: u32, name_capacity: u16, data_capacity: u32) -> Self {
        let slots = ValueSlots::with_capacity(data_capacity);
        Self {
            key_handle,
            index,
            name: StringBuffer::with_capacity(name_capacity),
            value_type: slots.value_type,
            data: slots.data,
            data_size: slots.data_size,
            data_len: slots.data_len,
        }
    }
}

impl NdrEncode for EnumValueRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        writer.write_u32(self.index);
        self.name.encode(writer)?;
        ValueSlots {
            value_type: self.value_type,
            data: self.data.clone(),
            data_size: self.data_size,
            data_len: self.data_len,
        }
        .encode(writer)
    }
}

impl NdrDecode for EnumValueRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let index = reader.read_u32()?;
        let name = StringBuffer::decode(reader)?;
        let ValueSlots { value_type, data, data_size, data_len } = ValueSlots::decode(reader)?;
        Ok(Self { key_handle, index, name, value_type, data, data_size, data_len })
    }
}

impl RrpRequest for EnumValueRequest {
    const OPNUM: Opnum = Opnum::BaseRegEnumValue;
    type Response = EnumValueResponse;
}

/// One enumerated value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumValueResponse {
    /// Value name.
    pub name: String,
    /// Value type.
    pub value_type: Option<ValueType>,
    /// Returned buffer.
    pub data: Option<Vec<u8>>,
    /// Value size, or the size needed on `ERROR_MORE_DATA`.
    pub data_size: Option<u32>,
    /// Bytes of `data` that are value.
    pub data_len: Option<u32>,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl EnumValueResponse {
    /// Value type, `REG_NONE` when absent.
    pub fn value_type(&self) -> ValueType {
        self.value_type.unwrap_or_default()
    }

    /// Value bytes truncated to the transmitted length.
    pub fn value(&self) -> &[u8] {
        ValueSlots::effective_data(self.data.as_deref(), Some(self.data_len.unwrap_or_default()))
    }
}

impl NdrEncode for EnumValueResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.name.encode(writer)?;
        ValueSlots {
            value_type: self.value_type,
            data: self.data.clone(),
            data_size: self.data_size,
            data_len: self.data_len,
        }
        .encode(writer)?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for EnumValueResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let name = String::decode(reader)?;
        let ValueSlots { value_type, data, data_size, data_len } = ValueSlots::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { name, value_type, data, data_size, data_len, return_code })
    }
}

impl RrpResponse for EnumValueResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn request_round_trip() {
        let request = EnumValueRequest::new(KeyHandle::new([0x55; 20]), 3, 512, 16);
        let decoded = EnumValueRequest::from_bytes(&request.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.name.capacity(), 512);
    }

    #[test]
    fn string_value_response() {
        let data = hex!(
            "06000002 00000200 00010000 00000000 03000000 5000610000000000"
            "04000200 01000000"
            "08000200 10000000 00000000 06000000 780079000000 0000"
            "0c000200 06000000"
            "10000200 06000000"
            "00000000"
        );
        let response = EnumValueResponse::from_bytes(&data).unwrap();
        assert_eq!(response.name, "Pa");
        assert_eq!(response.value_type(), ValueType::String);
        assert_eq!(response.value(), b"x\0y\0\0\0");
        assert_eq!(response.return_code, ReturnCode::SUCCESS);
    }

    #[test]
    fn custom_type_tag_is_kept() {
        let data = hex!(
            "06000002 00000200 00010000 00000000 03000000 5000610000000000"
            "04000200 00001000"
            "08000200 10000000 00000000 02000000 abcd 0000"
            "0c000200 02000000"
            "10000200 02000000"
            "00000000"
        );
        let response = EnumValueResponse::from_bytes(&data).unwrap();
        assert_eq!(response.value_type(), ValueType::Unknown(0x0010_0000));
        assert_eq!(response.value(), [0xab, 0xcd]);
        assert_eq!(response.to_bytes().unwrap().as_ref(), data);
    }
}
