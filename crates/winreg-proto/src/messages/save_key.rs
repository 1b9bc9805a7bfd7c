//! `BaseRegSaveKey` (opnum 20).
//!
//! The server writes the key, its sub-keys and values to a file on its own
//! disk. The path is interpreted by the server, so it is a Windows path
//! regardless of where the client runs.

use super::{RrpRequest, status_only_response};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, SecurityAttributes},
};

/// Save a key tree to a server-side file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveKeyRequest {
    /// Key to save.
    pub key_handle: KeyHandle,
    /// Destination path on the server; must not exist yet.
    pub path: String,
    /// Security applied to the new file, `None` for the default.
    pub security_attributes: Option<SecurityAttributes>,
}

impl SaveKeyRequest {
    /// Save `key_handle` to `path` with default file security.
    pub fn new(key_handle: KeyHandle, path: impl Into<String>) -> Self {
        Self { key_handle, path: path.into(), security_attributes: None }
    }
}

impl NdrEncode for SaveKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.path.encode(writer)?;
        writer.write_pointer(self.security_attributes.as_ref())
    }
}

impl NdrDecode for SaveKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let path = String::decode(reader)?;
        let security_attributes = reader.read_pointer()?;
        Ok(Self { key_handle, path, security_attributes })
    }
}

impl RrpRequest for SaveKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegSaveKey;
    type Response = SaveKeyResponse;
}

status_only_response! {
    /// Outcome of a save; `ERROR_ALREADY_EXISTS` when the file is present.
    SaveKeyResponse
}
