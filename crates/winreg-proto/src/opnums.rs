//! MS-RRP operation numbers.
//!
//! The opnum travels in the RPC request PDU header, not in the stub, so it is
//! the only thing telling a server how to parse the bytes that follow. The
//! table is dense from 0 to 35; the reserved slots are kept so that every
//! number a server could name decodes to something.

use std::fmt;

use crate::errors::{ProtocolError, Result};

/// One of the 36 numbered MS-RRP operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Opnum {
    OpenClassesRoot = 0,
    OpenCurrentUser = 1,
    OpenLocalMachine = 2,
    OpenPerformanceData = 3,
    OpenUsers = 4,
    BaseRegCloseKey = 5,
    BaseRegCreateKey = 6,
    BaseRegDeleteKey = 7,
    BaseRegDeleteValue = 8,
    BaseRegEnumKey = 9,
    BaseRegEnumValue = 10,
    BaseRegFlushKey = 11,
    BaseRegGetKeySecurity = 12,
    BaseRegLoadKey = 13,
    Opnum14NotImplemented = 14,
    BaseRegOpenKey = 15,
    BaseRegQueryInfoKey = 16,
    BaseRegQueryValue = 17,
    BaseRegReplaceKey = 18,
    BaseRegRestoreKey = 19,
    BaseRegSaveKey = 20,
    BaseRegSetKeySecurity = 21,
    BaseRegSetValue = 22,
    BaseRegUnLoadKey = 23,
    Opnum24NotImplemented = 24,
    Opnum25NotImplemented = 25,
    BaseRegGetVersion = 26,
    OpenCurrentConfig = 27,
    Opnum28NotImplemented = 28,
    BaseRegQueryMultipleValues = 29,
    Opnum30NotImplemented = 30,
    BaseRegSaveKeyEx = 31,
    OpenPerformanceText = 32,
    OpenPerformanceNlsText = 33,
    BaseRegQueryMultipleValues2 = 34,
    BaseRegDeleteKeyEx = 35,
}

impl Opnum {
    /// Every operation, in numeric order.
    pub const ALL: [Self; 36] = [
        Self::OpenClassesRoot,
        Self::OpenCurrentUser,
        Self::OpenLocalMachine,
        Self::OpenPerformanceData,
        Self::OpenUsers,
        Self::BaseRegCloseKey,
        Self::BaseRegCreateKey,
        Self::BaseRegDeleteKey,
        Self::BaseRegDeleteValue,
        Self::BaseRegEnumKey,
        Self::BaseRegEnumValue,
        Self::BaseRegFlushKey,
        Self::BaseRegGetKeySecurity,
        Self::BaseRegLoadKey,
        Self::Opnum14NotImplemented,
        Self::BaseRegOpenKey,
        Self::BaseRegQueryInfoKey,
        Self::BaseRegQueryValue,
        Self::BaseRegReplaceKey,
        Self::BaseRegRestoreKey,
        Self::BaseRegSaveKey,
        Self::BaseRegSetKeySecurity,
        Self::BaseRegSetValue,
        Self::BaseRegUnLoadKey,
        Self::Opnum24NotImplemented,
        Self::Opnum25NotImplemented,
        Self::BaseRegGetVersion,
        Self::OpenCurrentConfig,
        Self::Opnum28NotImplemented,
        Self::BaseRegQueryMultipleValues,
        Self::Opnum30NotImplemented,
        Self::BaseRegSaveKeyEx,
        Self::OpenPerformanceText,
        Self::OpenPerformanceNlsText,
        Self::BaseRegQueryMultipleValues2,
        Self::BaseRegDeleteKeyEx,
    ];

    /// Wire value.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire value; `None` above 35.
    pub const fn from_u16(value: u16) -> Option<Self> {
        if (value as usize) < Self::ALL.len() { Some(Self::ALL[value as usize]) } else { None }
    }

    /// Whether the slot is reserved and unused by servers.
    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::Opnum14NotImplemented
                | Self::Opnum24NotImplemented
                | Self::Opnum25NotImplemented
                | Self::Opnum28NotImplemented
                | Self::Opnum30NotImplemented
        )
    }

    /// Whether this opens one of the predefined root keys.
    pub const fn opens_predefined_key(self) -> bool {
        matches!(
            self,
            Self::OpenClassesRoot
                | Self::OpenCurrentUser
                | Self::OpenLocalMachine
                | Self::OpenPerformanceData
                | Self::OpenUsers
                | Self::OpenCurrentConfig
                | Self::OpenPerformanceText
                | Self::OpenPerformanceNlsText
        )
    }

    /// Whether a successful response carries a new key handle the caller
    /// must eventually close.
    pub const fn yields_handle(self) -> bool {
        self.opens_predefined_key() || matches!(self, Self::BaseRegCreateKey | Self::BaseRegOpenKey)
    }
}

impl TryFrom<u16> for Opnum {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self> {
        Self::from_u16(value).ok_or(ProtocolError::UnknownOpnum(value))
    }
}

impl From<Opnum> for u16 {
    fn from(opnum: Opnum) -> Self {
        opnum.to_u16()
    }
}

impl fmt::Display for Opnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.to_u16())
    }
}
