//! `BaseRegQueryValue` (opnum 17).
//!
//! The caller announces its buffer capacity in `lpcbData` and sends a
//! zero-filled buffer of that size. On success the server answers with the
//! value type, the value bytes, and `lpcbLen` set to the number of bytes that
//! are actually value; on `ERROR_MORE_DATA` `lpcbData` carries the size the
//! value needs.

use super::{RrpRequest, RrpResponse, value_slots::ValueSlots};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode, ValueType},
};

/// Read one named value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValueRequest {
    /// Key holding the value.
    pub key_handle: KeyHandle,
    /// Value name; empty for the default value.
    pub value_name: String,
    /// Type slot, sent as `REG_NONE`.
    pub value_type: Option<ValueType>,
    /// Zero-filled buffer; `None` when the capacity is zero.
    pub data: Option<Vec<u8>>,
    /// Buffer capacity in bytes.
    pub data_size: Option<u32>,
    /// Bytes transmitted in `data`.
    pub data_len: Option<u32>,
}

impl QueryValueRequest {
    /// Query `value_name` with a `capacity`-byte buffer.
    pub fn new(key_handle: KeyHandle, value_name: impl Into<String>, capacity: u32) -> Self {
        let slots = ValueSlots::with_capacity(capacity);
        Self {
            key_handle,
            value_name: value_name.into(),
            value_type: slots.value_type,
            data: slots.data,
            data_size: slots.data_size,
            data_len: slots.data_len,
        }
    }

    /// Buffer capacity announced to the server.
    pub fn capacity(&self) -> u32 {
        self.data_size.unwrap_or_default()
    }
}

impl NdrEncode for QueryValueRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.value_name.encode(writer)?;
        ValueSlots {
            value_type: self.value_type,
            data: self.data.clone(),
            data_size: self.data_size,
            data_len: self.data_len,
        }
        .encode(writer)
    }
}

impl NdrDecode for QueryValueRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let value_name = String::decode(reader)?;
        let ValueSlots { value_type, data, data_size, data_len } = ValueSlots::decode(reader)?;
        Ok(Self { key_handle, value_name, value_type, data, data_size, data_len })
    }
}

impl RrpRequest for QueryValueRequest {
    const OPNUM: Opnum = Opnum::BaseRegQueryValue;
    type Response = QueryValueResponse;
}

/// Value contents as returned by the server.
///
/// Null pointers in the response decode to `None`; the accessors fall back to
/// `REG_NONE`, an empty value and zero lengths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryValueResponse {
    /// Value type.
    pub value_type: Option<ValueType>,
    /// Returned buffer, possibly longer than the value.
    pub data: Option<Vec<u8>>,
    /// Value size, or the size needed on `ERROR_MORE_DATA`.
    pub data_size: Option<u32>,
    /// Bytes of `data` that are value.
    pub data_len: Option<u32>,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl QueryValueResponse {
    /// Value type, `REG_NONE` when absent.
    pub fn value_type(&self) -> ValueType {
        self.value_type.unwrap_or_default()
    }

    /// Effective value length (`lpcbLen`).
    pub fn effective_len(&self) -> u32 {
        self.data_len.unwrap_or_default()
    }

    /// Value bytes truncated to the effective length.
    pub fn value(&self) -> &[u8] {
        ValueSlots::effective_data(self.data.as_deref(), Some(self.effective_len()))
    }

    /// Size the value needs, as reported in `lpcbData`.
    pub fn required_size(&self) -> u32 {
        self.data_size.unwrap_or_default()
    }
}

impl NdrEncode for QueryValueResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
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

impl NdrDecode for QueryValueResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let ValueSlots { value_type, data, data_size, data_len } = ValueSlots::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { value_type, data, data_size, data_len, return_code })
    }
}

impl RrpResponse for QueryValueResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}
