//! Access masks and option bitmasks.
//!
//! All three types keep unknown bits: `from_bits_retain(x).bits() == x` for
//! every `u32`, so a mask read off the wire re-encodes unchanged.

use bitflags::bitflags;

use crate::{
    errors::Result,
    ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter},
};

bitflags! {
    /// REGSAM access mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Regsam: u32 {
        /// KEY_QUERY_VALUE
        const KEY_QUERY_VALUE = 0x0000_0001;
        /// KEY_SET_VALUE
        const KEY_SET_VALUE = 0x0000_0002;
        /// KEY_CREATE_SUB_KEY
        const KEY_CREATE_SUB_KEY = 0x0000_0004;
        /// KEY_ENUMERATE_SUB_KEYS
        const KEY_ENUMERATE_SUB_KEYS = 0x0000_0008;
        /// KEY_NOTIFY
        const KEY_NOTIFY = 0x0000_0010;
        /// KEY_CREATE_LINK
        const KEY_CREATE_LINK = 0x0000_0020;
        /// Access the 64-bit registry view.
        const KEY_WOW64_64KEY = 0x0000_0100;
        /// Access the 32-bit registry view.
        const KEY_WOW64_32KEY = 0x0000_0200;

        /// DELETE
        const DELETE = 0x0001_0000;
        /// READ_CONTROL
        const READ_CONTROL = 0x0002_0000;
        /// WRITE_DAC
        const WRITE_DAC = 0x0004_0000;
        /// WRITE_OWNER
        const WRITE_OWNER = 0x0008_0000;
        /// SYNCHRONIZE
        const SYNCHRONIZE = 0x0010_0000;

        /// ACCESS_SYSTEM_SECURITY
        const ACCESS_SYSTEM_SECURITY = 0x0100_0000;
        /// MAXIMUM_ALLOWED
        const MAXIMUM_ALLOWED = 0x0200_0000;

        /// GENERIC_ALL
        const GENERIC_ALL = 0x1000_0000;
        /// GENERIC_EXECUTE
        const GENERIC_EXECUTE = 0x2000_0000;
        /// GENERIC_WRITE
        const GENERIC_WRITE = 0x4000_0000;
        /// GENERIC_READ
        const GENERIC_READ = 0x8000_0000;

        /// KEY_READ: READ_CONTROL | QUERY_VALUE | ENUMERATE_SUB_KEYS | NOTIFY.
        const KEY_READ = 0x0002_0019;
        /// KEY_WRITE: READ_CONTROL | SET_VALUE | CREATE_SUB_KEY.
        const KEY_WRITE = 0x0002_0006;
        /// KEY_EXECUTE, identical to KEY_READ.
        const KEY_EXECUTE = 0x0002_0019;
        /// KEY_ALL_ACCESS
        const KEY_ALL_ACCESS = 0x000f_003f;
    }
}

impl Default for Regsam {
    /// `MAXIMUM_ALLOWED`, the mask every operation falls back to.
    fn default() -> Self {
        Self::MAXIMUM_ALLOWED
    }
}

bitflags! {
    /// Options accepted by `BaseRegCreateKey`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegOptions: u32 {
        /// REG_OPTION_VOLATILE: key lives in memory only.
        const VOLATILE = 0x0000_0001;
        /// REG_OPTION_CREATE_LINK: key is a symbolic link.
        const CREATE_LINK = 0x0000_0002;
        /// REG_OPTION_BACKUP_RESTORE: ignore the access mask, use backup privileges.
        const BACKUP_RESTORE = 0x0000_0004;
        /// REG_OPTION_OPEN_LINK: open the link itself, not its target.
        const OPEN_LINK = 0x0000_0008;
        /// REG_OPTION_DONT_VIRTUALIZE
        const DONT_VIRTUALIZE = 0x0000_0010;
    }
}

bitflags! {
    /// Options accepted by `BaseRegOpenKey`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenKeyOptions: u32 {
        /// REG_OPTION_BACKUP_RESTORE
        const BACKUP_RESTORE = 0x0000_0004;
        /// REG_OPTION_OPEN_LINK
        const OPEN_LINK = 0x0000_0008;
    }
}

macro_rules! u32_flags_codec {
    ($($ty:ty),*) => {$(
        impl NdrEncode for $ty {
            fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
                writer.write_u32(self.bits());
                Ok(())
            }
        }

        impl NdrDecode for $ty {
            fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
                reader.read_u32().map(Self::from_bits_retain)
            }
        }
    )*};
}

u32_flags_codec!(Regsam, RegOptions, OpenKeyOptions);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_masks_are_unions() {
        assert_eq!(
            Regsam::KEY_READ,
            Regsam::READ_CONTROL
                | Regsam::KEY_QUERY_VALUE
                | Regsam::KEY_ENUMERATE_SUB_KEYS
                | Regsam::KEY_NOTIFY
        );
        assert_eq!(
            Regsam::KEY_WRITE,
            Regsam::READ_CONTROL | Regsam::KEY_SET_VALUE | Regsam::KEY_CREATE_SUB_KEY
        );
        assert!(Regsam::KEY_ALL_ACCESS.contains(Regsam::KEY_READ | Regsam::KEY_WRITE));
        assert!(Regsam::KEY_ALL_ACCESS.contains(Regsam::DELETE | Regsam::WRITE_DAC));
    }

    #[test]
    fn maximum_allowed_wire_value() {
        assert_eq!(Regsam::default().to_bytes().unwrap().as_ref(), &[0x00, 0x00, 0x00, 0x02]);
        assert_eq!(Regsam::from_bytes(&[0x00, 0x00, 0x00, 0x02]).unwrap(), Regsam::MAXIMUM_ALLOWED);
    }

    #[test]
    fn unknown_bits_survive_decode() {
        let raw = 0x0000_8000 | Regsam::KEY_QUERY_VALUE.bits();
        let sam = Regsam::from_bytes(&raw.to_le_bytes()).unwrap();
        assert_eq!(sam.bits(), raw);
        assert_eq!(sam.to_bytes().unwrap().as_ref(), &raw.to_le_bytes());
    }

    #[test]
    fn option_values() {
        assert_eq!(RegOptions::VOLATILE.bits(), 1);
        assert_eq!(RegOptions::DONT_VIRTUALIZE.bits(), 0x10);
        assert_eq!(OpenKeyOptions::OPEN_LINK.bits(), RegOptions::OPEN_LINK.bits());
        assert_eq!(OpenKeyOptions::default().bits(), 0);
    }
}
