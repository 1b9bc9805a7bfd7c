//! Registry data model shared by the message catalog.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::little_endian::U32};

use crate::{
    errors::{ProtocolError, Result},
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
};

/// Size of an RPC context handle on the wire.
pub const KEY_HANDLE_SIZE: usize = 20;

/// Opaque server-assigned context handle for an open registry key.
///
/// Produced by the open/create operations, released by `BaseRegCloseKey`.
/// After close the server returns an all-zero handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct KeyHandle([u8; KEY_HANDLE_SIZE]);

impl KeyHandle {
    /// Size on the wire.
    pub const SIZE: usize = KEY_HANDLE_SIZE;

    /// The all-zero handle a server returns from a successful close.
    pub const NULL: Self = Self([0; KEY_HANDLE_SIZE]);

    /// Wrap raw handle bytes.
    pub const fn new(bytes: [u8; KEY_HANDLE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw handle bytes.
    pub const fn as_array(&self) -> &[u8; KEY_HANDLE_SIZE] {
        &self.0
    }

    /// Whether this is the all-zero handle.
    pub fn is_null(&self) -> bool {
        self.0 == [0; KEY_HANDLE_SIZE]
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHandle({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl NdrEncode for KeyHandle {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.align(4);
        writer.write_struct(self);
        Ok(())
    }
}

impl NdrDecode for KeyHandle {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.align(4)?;
        reader.read_struct()
    }
}

/// Win32 status code returned as the last field of every response.
///
/// Any 32-bit value round-trips; the named constants cover the codes the
/// registry service is documented to return.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReturnCode(u32);

macro_rules! return_codes {
    ($($name:ident = $value:literal,)*) => {
        impl ReturnCode {
            $(
                #[doc = concat!("`ERROR_", stringify!($name), "` (", stringify!($value), ").")]
                pub const $name: Self = Self($value);
            )*

            /// Symbolic Win32 name, when the code is a known one.
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(concat!("ERROR_", stringify!($name))),)*
                    _ => None,
                }
            }
        }
    };
}

return_codes! {
    SUCCESS = 0,
    INVALID_FUNCTION = 1,
    FILE_NOT_FOUND = 2,
    PATH_NOT_FOUND = 3,
    ACCESS_DENIED = 5,
    INVALID_HANDLE = 6,
    NOT_ENOUGH_MEMORY = 8,
    OUTOFMEMORY = 14,
    WRITE_PROTECT = 19,
    NOT_SUPPORTED = 50,
    INVALID_PARAMETER = 87,
    CALL_NOT_IMPLEMENTED = 120,
    INSUFFICIENT_BUFFER = 122,
    ALREADY_EXISTS = 183,
    MORE_DATA = 234,
    NO_MORE_ITEMS = 259,
    BADDB = 1009,
    BADKEY = 1010,
    CANTOPEN = 1011,
    CANTREAD = 1012,
    CANTWRITE = 1013,
    REGISTRY_RECOVERED = 1014,
    REGISTRY_CORRUPT = 1015,
    REGISTRY_IO_FAILED = 1016,
    NOT_REGISTRY_FILE = 1017,
    KEY_DELETED = 1018,
    KEY_HAS_CHILDREN = 1020,
    CHILD_MUST_BE_VOLATILE = 1021,
    PRIVILEGE_NOT_HELD = 1314,
}

impl ReturnCode {
    /// Wrap a raw status value.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw status value.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Zero means success.
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ReturnCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<ReturnCode> for u32 {
    fn from(code: ReturnCode) -> Self {
        code.0
    }
}

impl fmt::Debug for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ReturnCode({name})"),
            None => write!(f, "ReturnCode({:#010x})", self.0),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

impl NdrEncode for ReturnCode {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u32(self.0);
        Ok(())
    }
}

impl NdrDecode for ReturnCode {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.read_u32().map(Self)
    }
}

/// Type tag of a registry value.
///
/// The codec never interprets value bytes; see [`crate::value::RegistryValue`]
/// for the caller-side interpretation. Servers accept any 32-bit tag, so tags
/// outside the documented set survive a round trip as [`ValueType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// No defined type.
    #[default]
    None,
    /// NUL-terminated UTF-16 string.
    String,
    /// String with unexpanded environment references.
    ExpandString,
    /// Arbitrary bytes.
    Binary,
    /// 32-bit little-endian integer.
    Dword,
    /// 32-bit big-endian integer.
    DwordBigEndian,
    /// Symbolic link target (UTF-16, not terminated).
    Link,
    /// Sequence of NUL-terminated strings ending with an empty string.
    MultiString,
    /// Device-driver resource list.
    ResourceList,
    /// Hardware resource description.
    FullResourceDescriptor,
    /// Hardware resource requirements.
    ResourceRequirementsList,
    /// 64-bit little-endian integer.
    Qword,
    /// Application-defined tag outside REG_NONE..=REG_QWORD.
    ///
    /// Never holds one of the documented tags; build it with
    /// [`ValueType::from_u32`].
    Unknown(u32),
}

impl ValueType {
    /// Wire tag.
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::None => 0,
            Self::String => 1,
            Self::ExpandString => 2,
            Self::Binary => 3,
            Self::Dword => 4,
            Self::DwordBigEndian => 5,
            Self::Link => 6,
            Self::MultiString => 7,
            Self::ResourceList => 8,
            Self::FullResourceDescriptor => 9,
            Self::ResourceRequirementsList => 10,
            Self::Qword => 11,
            Self::Unknown(tag) => tag,
        }
    }

    /// Map a wire tag, keeping undocumented tags as [`ValueType::Unknown`].
    pub const fn from_u32(tag: u32) -> Self {
        match tag {
            0 => Self::None,
            1 => Self::String,
            2 => Self::ExpandString,
            3 => Self::Binary,
            4 => Self::Dword,
            5 => Self::DwordBigEndian,
            6 => Self::Link,
            7 => Self::MultiString,
            8 => Self::ResourceList,
            9 => Self::FullResourceDescriptor,
            10 => Self::ResourceRequirementsList,
            11 => Self::Qword,
            tag => Self::Unknown(tag),
        }
    }

    /// Win32 constant name, if the tag is a documented one.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::None => "REG_NONE",
            Self::String => "REG_SZ",
            Self::ExpandString => "REG_EXPAND_SZ",
            Self::Binary => "REG_BINARY",
            Self::Dword => "REG_DWORD",
            Self::DwordBigEndian => "REG_DWORD_BIG_ENDIAN",
            Self::Link => "REG_LINK",
            Self::MultiString => "REG_MULTI_SZ",
            Self::ResourceList => "REG_RESOURCE_LIST",
            Self::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR",
            Self::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST",
            Self::Qword => "REG_QWORD",
            Self::Unknown(_) => return None,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "REG_{:#010x}", self.to_u32()),
        }
    }
}

impl From<u32> for ValueType {
    fn from(tag: u32) -> Self {
        Self::from_u32(tag)
    }
}

impl From<ValueType> for u32 {
    fn from(value_type: ValueType) -> Self {
        value_type.to_u32()
    }
}

impl NdrEncode for ValueType {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u32(self.to_u32());
        Ok(())
    }
}

impl NdrDecode for ValueType {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        Ok(Self::from_u32(reader.read_u32()?))
    }
}

/// Outcome of `BaseRegCreateKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Disposition {
    /// The key did not exist and was created.
    #[default]
    CreatedNewKey = 1,
    /// The key already existed and was opened.
    OpenedExistingKey = 2,
}

impl TryFrom<u32> for Disposition {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::CreatedNewKey),
            2 => Ok(Self::OpenedExistingKey),
            other => Err(ProtocolError::InvalidDisposition(other)),
        }
    }
}

impl NdrEncode for Disposition {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_u32(*self as u32);
        Ok(())
    }
}

impl NdrDecode for Disposition {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        Self::try_from(reader.read_u32()?)
    }
}

/// RPC_SECURITY_ATTRIBUTES.
///
/// ```text
/// u32 nLength                   descriptor length in bytes
/// u32 referent                  RPC_SECURITY_DESCRIPTOR.lpSecurityDescriptor
/// u32 cbInSecurityDescriptor
/// u32 cbOutSecurityDescriptor
/// u8  bInheritHandle
/// -- deferred: conformant-varying byte array, when the referent is non-null
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityAttributes {
    /// Self-relative security descriptor bytes, if any.
    pub security_descriptor: Option<Vec<u8>>,
    /// Whether the resulting handle is inheritable.
    pub inherit_handle: bool,
}

impl NdrEncode for SecurityAttributes {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        let descriptor = self.security_descriptor.as_deref();
        let len = crate::ndr::wire_count(descriptor.map_or(0, <[u8]>::len))?;

        writer.write_u32(len);
        writer.write_referent(descriptor.is_some());
        writer.write_u32(len);
        writer.write_u32(len);
        writer.write_u8(u8::from(self.inherit_handle));
        if let Some(descriptor) = descriptor {
            writer.write_varying_bytes(len, descriptor)?;
        }
        Ok(())
    }
}

impl NdrDecode for SecurityAttributes {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let _length = reader.read_u32()?;
        reader.align(4)?;
        let referent_offset = reader.position();
        let referent = reader.read_referent()?;
        let _in_size = reader.read_u32()?;
        let _out_size = reader.read_u32()?;
        let inherit_handle = reader.read_u8()? != 0;

        let security_descriptor = match referent {
            Some(referent) => {
                reader.expect_referent_payload(referent_offset, referent)?;
                let (_, bytes) = reader.read_varying_bytes()?;
                Some(bytes)
            },
            None => None,
        };

        Ok(Self { security_descriptor, inherit_handle })
    }
}

/// FILETIME: 100ns intervals since 1601-01-01, as two little-endian halves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct FileTime {
    low: U32,
    high: U32,
}

impl FileTime {
    /// Build from the combined 64-bit tick count.
    pub fn new(ticks: u64) -> Self {
        Self { low: U32::new(ticks as u32), high: U32::new((ticks >> 32) as u32) }
    }

    /// Combined 64-bit tick count.
    pub fn ticks(self) -> u64 {
        (u64::from(self.high.get()) << 32) | u64::from(self.low.get())
    }
}

impl fmt::Debug for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileTime({})", self.ticks())
    }
}

impl NdrEncode for FileTime {
    fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.align(4);
        writer.write_struct(self);
        Ok(())
    }
}

impl NdrDecode for FileTime {
    fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        reader.align(4)?;
        reader.read_struct()
    }
}
