//! `BaseRegEnumKey` (opnum 9).
//!
//! The caller supplies empty buffers sized for the answer; the server fills
//! them and sends them back:
//!
//! ```text
//! request:  hKey | u32 dwIndex | lpNameIn (buffer) | ptr -> lpClassIn (buffer)
//!           | ptr -> FILETIME
//! response: lpNameOut | ptr -> lplpClassOut | ptr -> FILETIME | u32 return code
//! ```

use super::{RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, StringBuffer},
    opnums::Opnum,
    types::{FileTime, KeyHandle, ReturnCode},
};

/// Fetch the name of the `index`-th sub-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumKeyRequest {
    /// Key whose sub-keys are enumerated.
    pub key_handle: KeyHandle,
    /// Zero-based sub-key index.
    pub index: u32,
    /// Capacity for the returned name.
    pub name: StringBuffer,
    /// Capacity for the returned class, if wanted.
    pub class: Option<StringBuffer>,
    /// Whether to ask for the last-write time.
    pub last_write_time: Option<FileTime>,
}

impl EnumKeyRequest {
    /// Ask for the sub-key name at `index` with a `name_capacity`-byte
    /// buffer, no class, and the last-write time.
    pub fn new(key_handle: KeyHandle, index: u32, name_capacity: u16) -> Self {
        Self {
            key_handle,
            index,
            name: StringBuffer::with_capacity(name_capacity),
            class: None,
            last_write_time: Some(FileTime::default()),
        }
    }
}

impl NdrEncode for EnumKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        writer.write_u32(self.index);
        self.name.encode(writer)?;
        writer.write_pointer(self.class.as_ref())?;
        writer.write_pointer(self.last_write_time.as_ref())
    }
}

impl NdrDecode for EnumKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let index = reader.read_u32()?;
        let name = StringBuffer::decode(reader)?;
        let class = reader.read_pointer()?;
        let last_write_time = reader.read_pointer()?;
        Ok(Self { key_handle, index, name, class, last_write_time })
    }
}

impl RrpRequest for EnumKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegEnumKey;
    type Response = EnumKeyResponse;
}

/// One enumerated sub-key.
///
/// A return code of `NO_MORE_ITEMS` marks the end of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumKeyResponse {
    /// Sub-key name.
    pub name: String,
    /// Sub-key class, when requested.
    pub class: Option<String>,
    /// Last-write time, when requested.
    pub last_write_time: Option<FileTime>,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for EnumKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.name.encode(writer)?;
        writer.write_pointer(self.class.as_ref())?;
        writer.write_pointer(self.last_write_time.as_ref())?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for EnumKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let name = String::decode(reader)?;
        let class = reader.read_pointer()?;
        let last_write_time = reader.read_pointer()?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { name, class, last_write_time, return_code })
    }
}

impl RrpResponse for EnumKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}
