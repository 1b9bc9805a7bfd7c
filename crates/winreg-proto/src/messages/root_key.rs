//! The eight predefined-key open operations.
//!
//! `OpenClassesRoot`, `OpenLocalMachine` and friends share one wire layout and
//! differ only in their operation number, so they are a single generic request
//! specialized by a zero-sized marker type:
//!
//! ```text
//! request:  u32 ServerName referent (always null) | u32 samDesired
//! response: [u8; 20] phKey                        | u32 return code
//! ```

use std::{fmt, marker::PhantomData, str::FromStr};

use super::{KeyHandleResponse, RrpRequest, RrpResponse};
use crate::{
    errors::Result,
    flags::Regsam,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
    opnums::Opnum,
    types::{KeyHandle, ReturnCode},
};

/// Marker for one predefined root key.
pub trait RootKey: Send + Sync + 'static {
    /// Operation that opens this key.
    const OPNUM: Opnum;
    /// Win32 name, e.g. `HKEY_LOCAL_MACHINE`.
    const NAME: &'static str;
}

macro_rules! root_keys {
    ($($(#[$meta:meta])* $marker:ident, $alias:ident => $opnum:ident, $name:literal;)*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $marker;

        impl RootKey for $marker {
            const OPNUM: Opnum = Opnum::$opnum;
            const NAME: &'static str = $name;
        }

        #[doc = concat!("Request opening `", $name, "`.")]
        pub type $alias = OpenRootKeyRequest<$marker>;
    )*};
}

root_keys! {
    /// HKEY_CLASSES_ROOT
    HkeyClassesRoot, OpenClassesRootRequest => OpenClassesRoot, "HKEY_CLASSES_ROOT";
    /// HKEY_CURRENT_USER
    HkeyCurrentUser, OpenCurrentUserRequest => OpenCurrentUser, "HKEY_CURRENT_USER";
    /// HKEY_LOCAL_MACHINE
    HkeyLocalMachine, OpenLocalMachineRequest => OpenLocalMachine, "HKEY_LOCAL_MACHINE";
    /// HKEY_PERFORMANCE_DATA
    HkeyPerformanceData, OpenPerformanceDataRequest => OpenPerformanceData, "HKEY_PERFORMANCE_DATA";
    /// HKEY_USERS
    HkeyUsers, OpenUsersRequest => OpenUsers, "HKEY_USERS";
    /// HKEY_CURRENT_CONFIG
    HkeyCurrentConfig, OpenCurrentConfigRequest => OpenCurrentConfig, "HKEY_CURRENT_CONFIG";
    /// HKEY_PERFORMANCE_TEXT
    HkeyPerformanceText, OpenPerformanceTextRequest => OpenPerformanceText, "HKEY_PERFORMANCE_TEXT";
    /// HKEY_PERFORMANCE_NLSTEXT
    HkeyPerformanceNlsText, OpenPerformanceNlsTextRequest => OpenPerformanceNlsText, "HKEY_PERFORMANCE_NLSTEXT";
}

/// Open a predefined root key.
///
/// The server-name argument is ignored by servers and always sent as a null
/// pointer.
pub struct OpenRootKeyRequest<K> {
    /// Requested access.
    pub sam_desired: Regsam,
    key: PhantomData<K>,
}

impl<K> OpenRootKeyRequest<K> {
    /// Request with an explicit access mask.
    pub const fn new(sam_desired: Regsam) -> Self {
        Self { sam_desired, key: PhantomData }
    }
}

impl<K> Default for OpenRootKeyRequest<K> {
    fn default() -> Self {
        Self::new(Regsam::MAXIMUM_ALLOWED)
    }
}

// Manual impls: derives would demand `K: Clone` and friends.
impl<K> Clone for OpenRootKeyRequest<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for OpenRootKeyRequest<K> {}

impl<K> PartialEq for OpenRootKeyRequest<K> {
    fn eq(&self, other: &Self) -> bool {
        self.sam_desired == other.sam_desired
    }
}

impl<K> Eq for OpenRootKeyRequest<K> {}

impl<K: RootKey> fmt::Debug for OpenRootKeyRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRootKeyRequest")
            .field("key", &K::NAME)
            .field("sam_desired", &self.sam_desired)
            .finish()
    }
}

impl<K> NdrEncode for OpenRootKeyRequest<K> {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_referent(false);
        self.sam_desired.encode(writer)
    }
}

impl<K> NdrDecode for OpenRootKeyRequest<K> {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        // PREGISTRY_SERVER_NAME points at a single wchar when present.
        let _server_name = reader.read_pointer::<u16>()?;
        Ok(Self::new(Regsam::decode(reader)?))
    }
}

impl<K: RootKey> RrpRequest for OpenRootKeyRequest<K> {
    const OPNUM: Opnum = K::OPNUM;
    type Response = OpenRootKeyResponse;
}

/// Handle to the opened root key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenRootKeyResponse {
    /// New handle.
    pub key_handle: KeyHandle,
    /// Win32 status.
    pub return_code: ReturnCode,
}

impl NdrEncode for OpenRootKeyResponse {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        self.key_handle.encode(writer)?;
        self.return_code.encode(writer)
    }
}

impl NdrDecode for OpenRootKeyResponse {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let key_handle = KeyHandle::decode(reader)?;
        let return_code = ReturnCode::decode(reader)?;
        Ok(Self { key_handle, return_code })
    }
}

impl RrpResponse for OpenRootKeyResponse {
    fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

impl KeyHandleResponse for OpenRootKeyResponse {
    fn key_handle(&self) -> KeyHandle {
        self.key_handle
    }
}

/// Runtime choice of root key, for callers that pick the hive from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedKey {
    /// HKEY_CLASSES_ROOT
    ClassesRoot,
    /// HKEY_CURRENT_USER
    CurrentUser,
    /// HKEY_LOCAL_MACHINE
    LocalMachine,
    /// HKEY_PERFORMANCE_DATA
    PerformanceData,
    /// HKEY_USERS
    Users,
    /// HKEY_CURRENT_CONFIG
    CurrentConfig,
    /// HKEY_PERFORMANCE_TEXT
    PerformanceText,
    /// HKEY_PERFORMANCE_NLSTEXT
    PerformanceNlsText,
}

impl PredefinedKey {
    /// Every predefined key.
    pub const ALL: [Self; 8] = [
        Self::ClassesRoot,
        Self::CurrentUser,
        Self::LocalMachine,
        Self::PerformanceData,
        Self::Users,
        Self::CurrentConfig,
        Self::PerformanceText,
        Self::PerformanceNlsText,
    ];

    /// Operation that opens this key.
    pub const fn opnum(self) -> Opnum {
        match self {
            Self::ClassesRoot => HkeyClassesRoot::OPNUM,
            Self::CurrentUser => HkeyCurrentUser::OPNUM,
            Self::LocalMachine => HkeyLocalMachine::OPNUM,
            Self::PerformanceData => HkeyPerformanceData::OPNUM,
            Self::Users => HkeyUsers::OPNUM,
            Self::CurrentConfig => HkeyCurrentConfig::OPNUM,
            Self::PerformanceText => HkeyPerformanceText::OPNUM,
            Self::PerformanceNlsText => HkeyPerformanceNlsText::OPNUM,
        }
    }

    /// Win32 name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClassesRoot => HkeyClassesRoot::NAME,
            Self::CurrentUser => HkeyCurrentUser::NAME,
            Self::LocalMachine => HkeyLocalMachine::NAME,
            Self::PerformanceData => HkeyPerformanceData::NAME,
            Self::Users => HkeyUsers::NAME,
            Self::CurrentConfig => HkeyCurrentConfig::NAME,
            Self::PerformanceText => HkeyPerformanceText::NAME,
            Self::PerformanceNlsText => HkeyPerformanceNlsText::NAME,
        }
    }

    /// Conventional abbreviation, where one exists.
    pub const fn short_name(self) -> Option<&'static str> {
        match self {
            Self::ClassesRoot => Some("HKCR"),
            Self::CurrentUser => Some("HKCU"),
            Self::LocalMachine => Some("HKLM"),
            Self::Users => Some("HKU"),
            Self::CurrentConfig => Some("HKCC"),
            Self::PerformanceData | Self::PerformanceText | Self::PerformanceNlsText => None,
        }
    }
}

impl fmt::Display for PredefinedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized root key name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown predefined key {0:?}")]
pub struct UnknownPredefinedKey(pub String);

impl FromStr for PredefinedKey {
    type Err = UnknownPredefinedKey;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| {
                key.name().eq_ignore_ascii_case(s)
                    || key.short_name().is_some_and(|short| short.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| UnknownPredefinedKey(s.to_owned()))
    }
}
