//! `BaseRegFlushKey` (opnum 11).

use super::{RrpRequest, status_only_response};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::KeyHandle,
};

/// Write a key's pending changes to the backing hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushKeyRequest {
    /// Key to flush.
    pub key_handle: KeyHandle,
}

impl NdrEncode for FlushKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)
    }
}

impl NdrDecode for FlushKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        Ok(Self { key_handle: KeyHandle::decode(reader)? })
    }
}

impl RrpRequest for FlushKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegFlushKey;
    type Response = FlushKeyResponse;
}

status_only_response! {
    /// Outcome of a flush.
    FlushKeyResponse
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_handle_only() {
        let request = FlushKeyRequest { key_handle: KeyHandle::new([7; 20]) };
        assert_eq!(request.to_bytes().unwrap().len(), KeyHandle::SIZE);
    }
}
