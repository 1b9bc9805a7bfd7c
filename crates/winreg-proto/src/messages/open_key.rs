//! `BaseRegOpenKey` (opnum 15).
//!
//! ```text
//! request:  [u8; 20] hKey | RRP_UNICODE_STRING lpSubKey | u32 dwOptions | u32 samDesired
//! response: [u8; 20] phkResult | u32 return code
//! ```

use super::{KeyHandleResponse, RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    flags::{OpenKeyOptions, Regsam},
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode},
};

/// Open an existing sub-key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenKeyRequest {
    /// Parent key.
    pub key_handle: KeyHandle,
    /// Path of the sub-key relative to the parent, `\`-separated.
    pub sub_key: String,
    /// Open options.
    pub options: OpenKeyOptions,
    /// Requested access.
    pub sam_desired: Regsam,
}

impl OpenKeyRequest {
    /// Open `sub_key` under `key_handle` with no options and
    /// `MAXIMUM_ALLOWED` access.
    pub fn new(key_handle: KeyHandle, sub_key: impl Into<String>) -> Self {
        Self {
            key_handle,
            sub_key: sub_key.into(),
            options: OpenKeyOptions::empty(),
            sam_desired: Regsam::MAXIMUM_ALLOWED,
        }
    }

    /// Replace the requested access.
    #[must_use]
    pub fn with_sam(mut self, sam_desired: Regsam) -> Self {
        self.sam_desired = sam_desired;
        self
    }

    /// Replace the open options.
    #[must_use]
    pub fn with_options(mut self, options: OpenKeyOptions) -> Self {
        self.options = options;
        self
    }
}

impl NdrEncode for OpenKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.sub_key.encode(writer)?;
        self.options.encode(writer)?;
        self.sam_desired.encode(writer)
    }
}

impl NdrDecode for OpenKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let sub_key = String::decode(reader)?;
        let options = OpenKeyOptions::decode(reader)?;
        let sam_desired = Regsam::decode(reader)?;
        Ok(Self { key_handle, sub_key, options, sam_desired })
    }
}

impl RrpRequest for OpenKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegOpenKey;
    type Response = OpenKeyResponse;
}

/// Handle to the opened sub-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenKeyResponse {
    /// New handle.
    pub key_handle: KeyHandle,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for OpenKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for OpenKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { key_handle, return_code })
    }
}

impl RrpResponse for OpenKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

impl KeyHandleResponse for OpenKeyResponse {
    fn key_handle(&self) -> KeyHandle {
        self.key_handle
    }
}
