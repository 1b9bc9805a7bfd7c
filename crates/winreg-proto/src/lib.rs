//! Wire format for the Windows Remote Registry Protocol (MS-RRP).
//!
//! MS-RRP messages are NDR stubs carried in DCE/RPC request and response
//! PDUs over the `\PIPE\winreg` named pipe. This crate covers only the stubs:
//! the primitive NDR codec ([`ndr`]), the typed request/response pair for each
//! supported operation ([`messages`]), and the registry data model they are
//! built from. Binding, authentication and fragmentation belong to whatever
//! RPC transport carries the bytes.
//!
//! Everything here is pure and synchronous. Encoding never inspects the
//! network, decoding never panics on hostile input: malformed stubs surface as
//! [`ProtocolError`] and no partially decoded value escapes.
//!
//! # Example
//!
//! ```
//! use winreg_proto::{
//!     NdrDecode, NdrEncode, Regsam,
//!     messages::{OpenLocalMachineRequest, OpenRootKeyResponse},
//! };
//!
//! let request = OpenLocalMachineRequest::new(Regsam::KEY_READ);
//! assert_eq!(request.to_bytes().unwrap().as_ref(), [0, 0, 0, 0, 0x19, 0, 0x02, 0]);
//!
//! let response = OpenRootKeyResponse::from_bytes(&[0; 24]).unwrap();
//! assert!(response.return_code.is_success());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod flags;
pub mod interface;
pub mod messages;
pub mod ndr;
pub mod opnums;
pub mod types;
pub mod value;

pub use errors::{ProtocolError, Result};
pub use flags::{OpenKeyOptions, RegOptions, Regsam};
pub use interface::{InterfaceId, MS_RRP_INTERFACE, MS_RRP_PIPE_NAME};
pub use messages::{KeyHandleResponse, PredefinedKey, RrpRequest, RrpResponse};
pub use ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, StringBuffer};
pub use opnums::Opnum;
pub use types::{
    Disposition, FileTime, KEY_HANDLE_SIZE, KeyHandle, ReturnCode, SecurityAttributes, ValueType,
};
pub use value::RegistryValue;
