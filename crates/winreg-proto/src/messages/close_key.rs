//! `BaseRegCloseKey` (opnum 5).
//!
//! The request is the bare 20-byte handle. The server echoes a handle back,
//! all zeros once the close went through, so the caller's copy can be
//! overwritten and never reused.

use super::{RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode},
};

/// Release a key handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseKeyRequest {
    /// Handle to release.
    pub key_handle: KeyHandle,
}

impl CloseKeyRequest {
    /// Close `key_handle`.
    pub const fn new(key_handle: KeyHandle) -> Self {
        Self { key_handle }
    }
}

impl NdrEncode for CloseKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)
    }
}

impl NdrDecode for CloseKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        KeyHandle::decode(reader).map(Self::new)
    }
}

impl RrpRequest for CloseKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegCloseKey;
    type Response = CloseKeyResponse;
}

/// Handle echoed by the server, zeroed on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseKeyResponse {
    /// Returned handle.
    pub key_handle: KeyHandle,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for CloseKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for CloseKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { key_handle, return_code })
    }
}

impl RrpResponse for CloseKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}
