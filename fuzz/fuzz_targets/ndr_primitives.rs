//! Fuzz the NDR primitive readers directly.
//!
//! Every reader must fail cleanly on arbitrary input, including at
//! unaligned starting offsets.

#![no_main]

use libfuzzer_sys::fuzz_target;
use winreg_proto::{
    FileTime, KeyHandle, NdrDecode, NdrReader, RegistryValue, SecurityAttributes, StringBuffer,
    ValueType,
};

fuzz_target!(|data: &[u8]| {
    for offset in 0..data.len().min(4) {
        let _ = String::decode_at(data, offset);
        let _ = StringBuffer::decode_at(data, offset);
        let _ = KeyHandle::decode_at(data, offset);
        let _ = FileTime::decode_at(data, offset);
        let _ = SecurityAttributes::decode_at(data, offset);
    }

    let mut reader = NdrReader::new(data);
    let _ = reader.read_pointer::<u32>();
    let _ = reader.read_varying_bytes();
    let _ = reader.read_conformant_bytes();

    if let Some((tag, payload)) = data.split_first() {
        let value_type = ValueType::from_u32(u32::from(*tag));
        if let Ok(value) = RegistryValue::parse(value_type, payload) {
            assert_eq!(value.value_type(), value_type);
            let _ = RegistryValue::parse(value_type, &value.to_bytes());
        }
    }
});
