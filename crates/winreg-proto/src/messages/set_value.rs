//! `BaseRegSetValue` (opnum 22).
//!
//! ```text
//! hKey | RRP_UNICODE_STRING lpValueName | u32 dwType
//!      | conformant u8[] lpData | u32 cbData
//! ```
//!
//! `cbData` repeats the array count. Encoding always keeps them equal; a peer
//! that sends them unequal is tolerated, the array count wins and the
//! declared length stays visible through [`SetValueRequest::length_mismatch`].

use super::{RrpRequest, status_only_response};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ValueType},
    value::RegistryValue,
};

/// Create or overwrite a named value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetValueRequest {
    /// Key receiving the value.
    pub key_handle: KeyHandle,
    /// Value name; empty for the default value.
    pub value_name: String,
    /// Value type.
    pub value_type: ValueType,
    /// Raw value bytes.
    pub data: Vec<u8>,
    declared_len: Option<u32>,
}

impl SetValueRequest {
    /// Set `value_name` to `data` tagged as `value_type`.
    pub fn new(
        key_handle: KeyHandle,
        value_name: impl Into<String>,
        value_type: ValueType,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            key_handle,
            value_name: value_name.into(),
            value_type,
            data: data.into(),
            declared_len: None,
        }
    }

    /// Set `value_name` from a typed value.
    pub fn from_value(
        key_handle: KeyHandle,
        value_name: impl Into<String>,
        value: &RegistryValue,
    ) -> Self {
        Self::new(key_handle, value_name, value.value_type(), value.to_bytes())
    }

    /// The trailing `cbData` a decoded request carried, when it disagreed
    /// with the array count.
    pub fn length_mismatch(&self) -> Option<u32> {
        self.declared_len
    }
}

impl NdrEncode for SetValueRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.value_name.encode(writer)?;
        self.value_type.encode(writer)?;
        writer.write_conformant_bytes(&self.data)?;
        writer.write_u32(crate::ndr::wire_count(self.data.len())?);
        Ok(())
    }
}

impl NdrDecode for SetValueRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let value_name = String::decode(reader)?;
        let value_type = ValueType::decode(reader)?;
        let data = reader.read_conformant_bytes()?;
        let declared = reader.read_u32()?;
        let declared_len = (declared as usize != data.len()).then_some(declared);
        Ok(Self { key_handle, value_name, value_type, data, declared_len })
    }
}

impl RrpRequest for SetValueRequest {
    const OPNUM: Opnum = Opnum::BaseRegSetValue;
    type Response = SetValueResponse;
}

status_only_response! {
    /// Outcome of a value write.
    SetValueResponse
}
