//! `BaseRegDeleteKey` (opnum 7).

use super::{RrpRequest, status_only_response};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::KeyHandle,
};

/// Delete a sub-key that has no sub-keys of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteKeyRequest {
    /// Parent key.
    pub key_handle: KeyHandle,
    /// Name of the sub-key to delete, relative to the parent.
    pub sub_key: String,
}

impl DeleteKeyRequest {
    /// Delete `sub_key` under `key_handle`.
    pub fn new(key_handle: KeyHandle, sub_key: impl Into<String>) -> Self {
        Self { key_handle, sub_key: sub_key.into() }
    }
}

impl NdrEncode for DeleteKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.sub_key.encode(writer)
    }
}

impl NdrDecode for DeleteKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let sub_key = String::decode(reader)?;
        Ok(Self { key_handle, sub_key })
    }
}

impl RrpRequest for DeleteKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegDeleteKey;
    type Response = DeleteKeyResponse;
}

status_only_response! {
    /// Outcome of a key deletion.
    DeleteKeyResponse
}
