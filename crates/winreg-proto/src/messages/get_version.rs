//! `BaseRegGetVersion` (opnum 26).

use super::{RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode},
};

/// Ask the server for its registry version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetVersionRequest {
    /// Any open key.
    pub key_handle: KeyHandle,
}

impl NdrEncode for GetVersionRequest {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)
    }
}

impl NdrDecode for GetVersionRequest {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        Ok(Self { key_handle: KeyHandle::decode(reader)? })
    }
}

impl RrpRequest for GetVersionRequest {
    const OPNUM: Opnum = Opnum::BaseRegGetVersion;
    type Response = GetVersionResponse;
}

/// Registry version number (5 on every shipping Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetVersionResponse {
    /// Version number.
    pub version: u32,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for GetVersionResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u32(self.version);
        self.return_code.encode(writer)
    }
}

impl NdrDecode for GetVersionResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { version, return_code })
    }
}

impl RrpResponse for GetVersionResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn response_layout() {
        let response = GetVersionResponse::from_bytes(&hex!("05000000 00000000")).unwrap();
        assert_eq!(response, GetVersionResponse { version: 5, return_code: ReturnCode::SUCCESS });
    }
}
