//! Typed interpretation of registry value payloads.
//!
//! Messages carry value data as opaque bytes tagged with a [`ValueType`].
//! Nothing in the codec applies this module; callers opt in when they want
//! to read a `REG_SZ` as a `String` or build a `REG_DWORD` payload.

use crate::{
    errors::{ProtocolError, Result},
    types::ValueType,
};

/// A registry value with its payload interpreted according to its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    /// REG_NONE payload, kept raw.
    None(Vec<u8>),
    /// REG_SZ
    String(String),
    /// REG_EXPAND_SZ, references left unexpanded.
    ExpandString(String),
    /// REG_BINARY
    Binary(Vec<u8>),
    /// REG_DWORD
    Dword(u32),
    /// REG_DWORD_BIG_ENDIAN
    DwordBigEndian(u32),
    /// REG_LINK target.
    Link(String),
    /// REG_MULTI_SZ
    MultiString(Vec<String>),
    /// REG_QWORD
    Qword(u64),
    /// Resource list and application-defined types, kept raw.
    Other(ValueType, Vec<u8>),
}

impl RegistryValue {
    /// Interpret `data` as a value of type `value_type`.
    ///
    /// String payloads may or may not carry their terminator; one trailing
    /// NUL is dropped if present. Integer payloads must have exactly the
    /// integer's width.
    pub fn parse(value_type: ValueType, data: &[u8]) -> Result<Self> {
        Ok(match value_type {
            ValueType::None => Self::None(data.to_vec()),
            ValueType::String => Self::String(decode_sz(value_type, data)?),
            ValueType::ExpandString => Self::ExpandString(decode_sz(value_type, data)?),
            ValueType::Binary => Self::Binary(data.to_vec()),
            ValueType::Dword => Self::Dword(u32::from_le_bytes(fixed(value_type, data)?)),
            ValueType::DwordBigEndian => {
                Self::DwordBigEndian(u32::from_be_bytes(fixed(value_type, data)?))
            },
            ValueType::Link => Self::Link(decode_utf16(value_type, data)?),
            ValueType::MultiString => Self::MultiString(decode_multi_sz(data)?),
            ValueType::Qword => Self::Qword(u64::from_le_bytes(fixed(value_type, data)?)),
            other => Self::Other(other, data.to_vec()),
        })
    }

    /// Type tag for this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::None(_) => ValueType::None,
            Self::String(_) => ValueType::String,
            Self::ExpandString(_) => ValueType::ExpandString,
            Self::Binary(_) => ValueType::Binary,
            Self::Dword(_) => ValueType::Dword,
            Self::DwordBigEndian(_) => ValueType::DwordBigEndian,
            Self::Link(_) => ValueType::Link,
            Self::MultiString(_) => ValueType::MultiString,
            Self::Qword(_) => ValueType::Qword,
            Self::Other(value_type, _) => *value_type,
        }
    }

    /// Payload bytes as a server stores them.
    ///
    /// Strings are NUL-terminated, multi-strings end with an extra NUL, and
    /// links carry no terminator.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::None(data) | Self::Binary(data) | Self::Other(_, data) => data.clone(),
            Self::String(text) | Self::ExpandString(text) => utf16_bytes(text, 1),
            Self::Link(text) => utf16_bytes(text, 0),
            Self::MultiString(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(utf16_bytes(item, 1));
                }
                out.extend_from_slice(&[0, 0]);
                out
            },
            Self::Dword(value) => value.to_le_bytes().to_vec(),
            Self::DwordBigEndian(value) => value.to_be_bytes().to_vec(),
            Self::Qword(value) => value.to_le_bytes().to_vec(),
        }
    }

    /// String content, for the string-like variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) | Self::ExpandString(text) | Self::Link(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content, for the integer variants.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Dword(value) | Self::DwordBigEndian(value) => Some(u64::from(*value)),
            Self::Qword(value) => Some(*value),
            _ => None,
        }
    }
}

fn fixed<const N: usize>(value_type: ValueType, data: &[u8]) -> Result<[u8; N]> {
    data.try_into().map_err(|_| ProtocolError::ValueMismatch {
        value_type,
        reason: "payload width does not match the integer type",
    })
}

fn units(value_type: ValueType, data: &[u8]) -> Result<Vec<u16>> {
    if data.len() % 2 != 0 {
        return Err(ProtocolError::ValueMismatch {
            value_type,
            reason: "odd byte length",
        });
    }
    Ok(data.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect())
}

fn from_units(value_type: ValueType, units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|_| ProtocolError::ValueMismatch {
        value_type,
        reason: "invalid UTF-16",
    })
}

fn decode_utf16(value_type: ValueType, data: &[u8]) -> Result<String> {
    from_units(value_type, &units(value_type, data)?)
}

fn decode_sz(value_type: ValueType, data: &[u8]) -> Result<String> {
    let units = units(value_type, data)?;
    let text = match units.split_last() {
        Some((0, rest)) => rest,
        _ => units.as_slice(),
    };
    from_units(value_type, text)
}

fn decode_multi_sz(data: &[u8]) -> Result<Vec<String>> {
    let units = units(ValueType::MultiString, data)?;
    let mut items: Vec<String> = Vec::new();
    for item in units.split(|unit| *unit == 0) {
        if item.is_empty() {
            break;
        }
        items.push(from_units(ValueType::MultiString, item)?);
    }
    Ok(items)
}

fn utf16_bytes(text: &str, terminators: usize) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::repeat_n(0, terminators))
        .flat_map(u16::to_le_bytes)
        .collect()
}
