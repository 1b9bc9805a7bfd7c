//! Request/response pairs for the MS-RRP operations this crate speaks.
//!
//! Each request type names its operation number and its response type, so the
//! invoker can go from a request value to the bytes it sends and back to a
//! typed response without a lookup table:
//!
//! ```text
//! OpenKeyRequest ──encode──► stub ──transport──► stub ──decode──► OpenKeyResponse
//!        │                                                              │
//!        └── OPNUM = BaseRegOpenKey (15)                 return_code() ─┘
//! ```
//!
//! Fields are laid out in MS-RRP order. Every response ends with the 4-byte
//! Win32 return code; a response is decoded the same way whether that code is
//! zero or not, servers fill output fields with zeros on failure.

mod close_key;
mod create_key;
mod delete_key;
mod delete_value;
mod enum_key;
mod enum_value;
mod flush_key;
mod get_version;
mod open_key;
mod query_info_key;
mod query_multiple_values;
mod query_value;
mod root_key;
mod save_key;
mod set_value;
mod value_slots;

use std::fmt::Debug;

pub use close_key::{CloseKeyRequest, CloseKeyResponse};
pub use create_key::{CreateKeyRequest, CreateKeyResponse};
pub use delete_key::{DeleteKeyRequest, DeleteKeyResponse};
pub use delete_value::{DeleteValueRequest, DeleteValueResponse};
pub use enum_key::{EnumKeyRequest, EnumKeyResponse};
pub use enum_value::{EnumValueRequest, EnumValueResponse};
pub use flush_key::{FlushKeyRequest, FlushKeyResponse};
pub use get_version::{GetVersionRequest, GetVersionResponse};
pub use open_key::{OpenKeyRequest, OpenKeyResponse};
pub use query_info_key::{QueryInfoKeyRequest, QueryInfoKeyResponse};
pub use query_multiple_values::{
    QueryMultipleValuesRequest, QueryMultipleValuesResponse, ValueEntry,
};
pub use query_value::{QueryValueRequest, QueryValueResponse};
pub use root_key::{
    HkeyClassesRoot, HkeyCurrentConfig, HkeyCurrentUser, HkeyLocalMachine, HkeyPerformanceData,
    HkeyPerformanceNlsText, HkeyPerformanceText, HkeyUsers, OpenClassesRootRequest,
    OpenCurrentConfigRequest, OpenCurrentUserRequest, OpenLocalMachineRequest,
    OpenPerformanceDataRequest, OpenPerformanceNlsTextRequest, OpenPerformanceTextRequest,
    OpenRootKeyRequest, OpenRootKeyResponse, OpenUsersRequest, PredefinedKey, RootKey,
    UnknownPredefinedKey,
};
pub use save_key::{SaveKeyRequest, SaveKeyResponse};
pub use set_value::{SetValueRequest, SetValueResponse};

use crate::{
    ndr::{NdrDecode, NdrEncode},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode},
};

/// An MS-RRP request stub.
pub trait RrpRequest: NdrEncode + NdrDecode + Debug + Send + Sync {
    /// Operation number carried in the RPC request header.
    const OPNUM: Opnum;

    /// Stub the server answers with.
    type Response: RrpResponse;
}

/// An MS-RRP response stub.
pub trait RrpResponse: NdrEncode + NdrDecode + Debug + Send + Sync {
    /// Win32 status the server returned.
    fn return_code(&self) -> ReturnCode;
}

/// A response carrying a newly opened key handle.
pub trait KeyHandleResponse: RrpResponse {
    /// Handle the server assigned.
    fn key_handle(&self) -> KeyHandle;
}

/// Responses made of nothing but a return code.
macro_rules! status_only_response {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            /// Win32 status.
            pub return_code: $crate::types::ReturnCode,
        }

        impl $crate::ndr::NdrEncode for $name {
            fn encode(&self, writer: &mut $crate::ndr::NdrWriter) -> $crate::errors::Result<()> {
                $crate::ndr::NdrEncode::encode(&self.return_code, writer)
            }
        }

        impl $crate::ndr::NdrDecode for $name {
            fn decode(reader: &mut $crate::ndr::NdrReader<'_>) -> $crate::errors::Result<Self> {
                let return_code =
                    <$crate::types::ReturnCode as $crate::ndr::NdrDecode>::decode(reader)?;
                Ok(Self { return_code })
            }
        }

        impl $crate::messages::RrpResponse for $name {
            fn return_code(&self) -> $crate::types::ReturnCode {
                self.return_code
            }
        }
    };
}

pub(crate) use status_only_response;

/// Decode a value that sits behind an always-present pointer, falling back to
/// the type's default when a peer sent a null one anyway.
pub(crate) fn decode_pointee_or_default<T: NdrDecode + Default>(
    reader: &mut crate::ndr::NdrReader<'_>,
) -> crate::errors::Result<T> {
    reader.read_pointer::<T>().map(Option::unwrap_or_default)
}
