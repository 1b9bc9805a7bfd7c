//! Byte-level snapshots of request stubs.
//!
//! Each snapshot was checked field by field against the MS-RRP IDL. A change
//! here means the bytes on the wire changed.

use winreg_proto::{
    KeyHandle, NdrEncode, RegOptions, RegistryValue, Regsam,
    messages::{CreateKeyRequest, OpenLocalMachineRequest, SaveKeyRequest, SetValueRequest},
};

fn handle() -> KeyHandle {
    let mut bytes = [0u8; 20];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = i as u8 + 1;
    }
    KeyHandle::new(bytes)
}

fn wire_hex(message: &impl NdrEncode) -> String {
    hex::encode(message.to_bytes().unwrap())
}

#[test]
fn open_local_machine_key_read() {
    insta::assert_snapshot!(wire_hex(&OpenLocalMachineRequest::new(Regsam::KEY_READ)), @"0000000019000200");
}

#[test]
fn create_volatile_key() {
    let request = CreateKeyRequest::new(handle(), "BETO").with_options(RegOptions::VOLATILE);
    insta::assert_snapshot!(
        wire_hex(&request),
        @"0102030405060708090a0b0c0d0e0f10111213140a000a00000002000500000000000000050000004200450054004f0000000000000000000000000001000000000000020400020000000000000000000000000000000000000000000800020001000000"
    );
}

#[test]
fn save_key_without_security_attributes() {
    let request = SaveKeyRequest::new(handle(), r"C:\Windows\Temp\dump");
    insta::assert_snapshot!(
        wire_hex(&request),
        @"0102030405060708090a0b0c0d0e0f10111213142a002a000000020015000000000000001500000043003a005c00570069006e0064006f00770073005c00540065006d0070005c00640075006d0070000000000000000000"
    );
}

#[test]
fn set_dword_value() {
    let request = SetValueRequest::from_value(handle(), "Start", &RegistryValue::Dword(2));
    insta::assert_snapshot!(
        wire_hex(&request),
        @"0102030405060708090a0b0c0d0e0f10111213140c000c000000020006000000000000000600000053007400610072007400000004000000040000000200000004000000"
    );
}
