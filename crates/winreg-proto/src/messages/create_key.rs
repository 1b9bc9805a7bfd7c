//! `BaseRegCreateKey` (opnum 6).
//!
//! ```text
//! request:
//!   [u8; 20]            hKey
//!   RRP_UNICODE_STRING  lpSubKey
//!   RRP_UNICODE_STRING  lpClass
//!   u32                 dwOptions
//!   u32                 samDesired
//!   ptr -> RPC_SECURITY_ATTRIBUTES   (always sent, possibly empty)
//!   ptr -> u32 disposition           (always sent, overwritten by the server)
//! response:
//!   [u8; 20] phkResult | ptr -> u32 disposition | u32 return code
//! ```

use super::{KeyHandleResponse, RrpRequest, RrpResponse, decode_pointee_or_default};
use crate::{
    errors::Result,
    flags::{RegOptions, Regsam},
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{Disposition, KeyHandle, ReturnCode, SecurityAttributes},
};

/// Create a sub-key, or open it if it already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateKeyRequest {
    /// Parent key.
    pub key_handle: KeyHandle,
    /// Path of the sub-key relative to the parent.
    pub sub_key: String,
    /// Key class; usually empty.
    pub class: String,
    /// Creation options.
    pub options: RegOptions,
    /// Requested access.
    pub sam_desired: Regsam,
    /// Security applied to a newly created key.
    pub security_attributes: SecurityAttributes,
    /// Initial disposition, ignored by the server.
    pub disposition: Disposition,
}

impl CreateKeyRequest {
    /// Create `sub_key` under `key_handle` with an empty class, no options,
    /// `MAXIMUM_ALLOWED` access and empty security attributes.
    pub fn new(key_handle: KeyHandle, sub_key: impl Into<String>) -> Self {
        Self {
            key_handle,
            sub_key: sub_key.into(),
            class: String::new(),
            options: RegOptions::empty(),
            sam_desired: Regsam::MAXIMUM_ALLOWED,
            security_attributes: SecurityAttributes::default(),
            disposition: Disposition::CreatedNewKey,
        }
    }

    /// Replace the creation options.
    #[must_use]
    pub fn with_options(mut self, options: RegOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the requested access.
    #[must_use]
    pub fn with_sam(mut self, sam_desired: Regsam) -> Self {
        self.sam_desired = sam_desired;
        self
    }

    /// Replace the key class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Replace the security attributes.
    #[must_use]
    pub fn with_security_attributes(mut self, security_attributes: SecurityAttributes) -> Self {
        self.security_attributes = security_attributes;
        self
    }
}

impl NdrEncode for CreateKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.sub_key.encode(writer)?;
        self.class.encode(writer)?;
        self.options.encode(writer)?;
        self.sam_desired.encode(writer)?;
        writer.write_pointer(Some(&self.security_attributes))?;
        writer.write_pointer(Some(&self.disposition))
    }
}

impl NdrDecode for CreateKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let sub_key = String::decode(reader)?;
        let class = String::decode(reader)?;
        let options = RegOptions::decode(reader)?;
        let sam_desired = Regsam::decode(reader)?;
        let security_attributes = decode_pointee_or_default(reader)?;
        let disposition = decode_pointee_or_default(reader)?;
        Ok(Self {
            key_handle,
            sub_key,
            class,
            options,
            sam_desired,
            security_attributes,
            disposition,
        })
    }
}

impl RrpRequest for CreateKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegCreateKey;
    type Response = CreateKeyResponse;
}

/// Handle to the created or opened key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateKeyResponse {
    /// New handle.
    pub key_handle: KeyHandle,
    /// Whether the key was created; `None` if the server sent a null pointer.
    pub disposition: Option<Disposition>,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for CreateKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        writer.write_pointer(self.disposition.as_ref())?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for CreateKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let disposition = reader.read_pointer()?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { key_handle, disposition, return_code })
    }
}

impl RrpResponse for CreateKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

impl KeyHandleResponse for CreateKeyResponse {
    fn key_handle(&self) -> KeyHandle {
        self.key_handle
    }
}
