//! `BaseRegDeleteValue` (opnum 8).

use super::{RrpRequest, status_only_response};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::KeyHandle,
};

/// Remove a named value from a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteValueRequest {
    /// Key holding the value.
    pub key_handle: KeyHandle,
    /// Value name; empty for the key's default value.
    pub value_name: String,
}

impl DeleteValueRequest {
    /// Delete `value_name` from `key_handle`.
    pub fn new(key_handle: KeyHandle, value_name: impl Into<String>) -> Self {
        Self { key_handle, value_name: value_name.into() }
    }
}

impl NdrEncode for DeleteValueRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.value_name.encode(writer)
    }
}

impl NdrDecode for DeleteValueRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let value_name = String::decode(reader)?;
        Ok(Self { key_handle, value_name })
    }
}

impl RrpRequest for DeleteValueRequest {
    const OPNUM: Opnum = Opnum::BaseRegDeleteValue;
    type Response = DeleteValueResponse;
}

status_only_response! {
    /// Outcome of a value deletion.
    DeleteValueResponse
}
