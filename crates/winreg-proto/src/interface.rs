//! RPC interface identity of the remote registry service.

use std::fmt;

use uuid::Uuid;

/// RPC interface identifier: UUID plus major/minor version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId {
    /// Interface UUID.
    pub uuid: Uuid,
    /// Major version.
    pub version_major: u16,
    /// Minor version.
    pub version_minor: u16,
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.version_major, self.version_minor)
    }
}

/// The `winreg` interface, `338cd001-2244-31f1-aaaa-900038001003` v1.0.
pub const MS_RRP_INTERFACE: InterfaceId = InterfaceId {
    uuid: Uuid::from_u128(0x338c_d001_2244_31f1_aaaa_9000_3800_1003),
    version_major: 1,
    version_minor: 0,
};

/// Named pipe the service listens on (`\PIPE\winreg`).
pub const MS_RRP_PIPE_NAME: &str = "winreg";
