//! Registry client errors.

use std::io;

use thiserror::Error;
use winreg_proto::{Opnum, ProtocolError, ReturnCode};

/// Errors surfaced by [`RegistryClient`](crate::RegistryClient) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The RPC transport failed to deliver the request or its response.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The request could not be encoded.
    #[error("failed to encode {opnum} request: {source}")]
    Encode {
        /// Operation being encoded.
        opnum: Opnum,
        /// Codec failure.
        #[source]
        source: ProtocolError,
    },

    /// The response stub was malformed.
    #[error("failed to decode {opnum} response: {source}")]
    Decode {
        /// Operation whose response failed to decode.
        opnum: Opnum,
        /// Codec failure.
        #[source]
        source: ProtocolError,
    },

    /// The server answered with a non-zero Win32 status.
    #[error("{opnum} failed: {code}")]
    OperationFailed {
        /// Operation that failed.
        opnum: Opnum,
        /// Status the server returned.
        code: ReturnCode,
    },

    /// The server reported a value larger than the client will buffer.
    #[error("{opnum} needs a {requested}-byte buffer, above the {limit}-byte limit")]
    ValueTooLarge {
        /// Operation that asked for the buffer.
        opnum: Opnum,
        /// Size the server reported.
        requested: u32,
        /// Configured `max_value_size`.
        limit: u32,
    },

    /// Reading a saved hive back from the server failed.
    #[error("file transfer error: {0}")]
    FileTransfer(#[source] io::Error),
}

impl RegistryError {
    /// Win32 status carried by an `OperationFailed` error.
    pub fn return_code(&self) -> Option<ReturnCode> {
        match self {
            Self::OperationFailed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Operation the error belongs to, when there is one.
    pub fn opnum(&self) -> Option<Opnum> {
        match self {
            Self::Encode { opnum, .. }
            | Self::Decode { opnum, .. }
            | Self::OperationFailed { opnum, .. }
            | Self::ValueTooLarge { opnum, .. } => Some(*opnum),
            Self::Transport(_) | Self::FileTransfer(_) => None,
        }
    }
}

/// Result alias for registry client operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
