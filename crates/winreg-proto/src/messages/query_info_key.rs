//! `BaseRegQueryInfoKey` (opnum 16).
//!
//! ```text
//! request:  hKey | lpClassIn (buffer)
//! response: lpClassOut | u32 x 7 counters | FILETIME | u32 return code
//! ```

use super::{RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, StringBuffer},
    opnums::Opnum,
    types::{FileTime, KeyHandle, ReturnCode},
};

/// Fetch a key's class, counts and size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryInfoKeyRequest {
    /// Key to describe.
    pub key_handle: KeyHandle,
    /// Capacity for the returned class name.
    pub class: StringBuffer,
}

impl QueryInfoKeyRequest {
    /// Describe `key_handle`, with room for a `class_capacity`-byte class.
    pub const fn new(key_handle: KeyHandle, class_capacity: u16) -> Self {
        Self { key_handle, class: StringBuffer::with_capacity(class_capacity) }
    }
}

impl NdrEncode for QueryInfoKeyRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.class.encode(writer)
    }
}

impl NdrDecode for QueryInfoKeyRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let class = StringBuffer::decode(reader)?;
        Ok(Self { key_handle, class })
    }
}

impl RrpRequest for QueryInfoKeyRequest {
    const OPNUM: Opnum = Opnum::BaseRegQueryInfoKey;
    type Response = QueryInfoKeyResponse;
}

/// Key metadata. Name and value lengths are in UTF-16 units, without the
/// terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryInfoKeyResponse {
    /// Key class.
    pub class: String,
    /// Number of sub-keys.
    pub sub_keys: u32,
    /// Longest sub-key name.
    pub max_sub_key_len: u32,
    /// Longest sub-key class.
    pub max_class_len: u32,
    /// Number of values.
    pub values: u32,
    /// Longest value name.
    pub max_value_name_len: u32,
    /// Largest value payload, in bytes.
    pub max_value_len: u32,
    /// Size of the key's security descriptor, in bytes.
    pub security_descriptor_len: u32,
    /// Last time the key or one of its values changed.
    pub last_write_time: FileTime,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for QueryInfoKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.class.encode(writer)?;
        for counter in [
            self.sub_keys,
            self.max_sub_key_len,
            self.max_class_len,
            self.values,
            self.max_value_name_len,
            self.max_value_len,
            self.security_descriptor_len,
        ] {
            writer.write_u32(counter);
        }
        self.last_write_time.encode(writer)?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for QueryInfoKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let class = String::decode(reader)?;
        let sub_keys = reader.read_u32()?;
        let max_sub_key_len = reader.read_u32()?;
        let max_class_len = reader.read_u32()?;
        let values = reader.read_u32()?;
        let max_value_name_len = reader.read_u32()?;
        let max_value_len = reader.read_u32()?;
        let security_descriptor_len = reader.read_u32()?;
        let last_write_time = FileTime::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self {
            class,
            sub_keys,
            max_sub_key_len,
            max_class_len,
            values,
            max_value_name_len,
            max_value_len,
            security_descriptor_len,
            last_write_time,
            return_code,
        })
    }
}

impl RrpResponse for QueryInfoKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn response_counters_in_order() {
        let data = hex!(
            "00000000 00000000"
            "03000000 0c000000 00000000 02000000 05000000 08000000 14010000"
            "80b6d0a1 5c3cd901"
            "00000000"
        );
        let response = QueryInfoKeyResponse::from_bytes(&data).unwrap();
        assert_eq!(response.class, "");
        assert_eq!(response.sub_keys, 3);
        assert_eq!(response.max_sub_key_len, 12);
        assert_eq!(response.values, 2);
        assert_eq!(response.max_value_name_len, 5);
        assert_eq!(response.max_value_len, 8);
        assert_eq!(response.security_descriptor_len, 0x114);
        assert_eq!(response.last_write_time.ticks(), 0x01d9_3c5c_a1d0_b680);
        assert_eq!(response.to_bytes().unwrap().as_ref(), data);
    }
}
