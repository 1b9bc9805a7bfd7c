//! Fuzz every request and response decoder.
//!
//! The first input byte picks the operation, the rest is the stub. Decoding
//! must never panic. Decoding normalizes some inputs (null pointers to
//! always-present fields, padding), so the check is that a value's encoding is
//! stable once it has been through one decode.

#![no_main]

use libfuzzer_sys::fuzz_target;
use winreg_proto::{
    NdrDecode, NdrEncode,
    messages::{
        CloseKeyRequest, CloseKeyResponse, CreateKeyRequest, CreateKeyResponse, DeleteKeyRequest,
        DeleteKeyResponse, DeleteValueRequest, DeleteValueResponse, EnumKeyRequest,
        EnumKeyResponse, EnumValueRequest, EnumValueResponse, FlushKeyRequest, FlushKeyResponse,
        GetVersionRequest, GetVersionResponse, OpenKeyRequest, OpenKeyResponse,
        OpenLocalMachineRequest, OpenRootKeyResponse, QueryInfoKeyRequest, QueryInfoKeyResponse,
        QueryMultipleValuesRequest, QueryMultipleValuesResponse, QueryValueRequest,
        QueryValueResponse, SaveKeyRequest, SaveKeyResponse, SetValueRequest, SetValueResponse,
    },
};

fn check<T: NdrDecode + NdrEncode>(data: &[u8]) {
    let Ok(value) = T::from_bytes(data) else {
        return;
    };
    let Ok(encoded) = value.to_bytes() else {
        return;
    };
    let again = T::from_bytes(&encoded).expect("re-encoded stub must decode");
    let stable = again.to_bytes().expect("decoded value must re-encode");
    assert_eq!(stable, encoded);
}

fuzz_target!(|data: &[u8]| {
    let Some((selector, stub)) = data.split_first() else {
        return;
    };

    match selector % 30 {
        0 => check::<OpenLocalMachineRequest>(stub),
        1 => check::<OpenRootKeyResponse>(stub),
        2 => check::<CloseKeyRequest>(stub),
        3 => check::<CloseKeyResponse>(stub),
        4 => check::<CreateKeyRequest>(stub),
        5 => check::<CreateKeyResponse>(stub),
        6 => check::<DeleteKeyRequest>(stub),
        7 => check::<DeleteKeyResponse>(stub),
        8 => check::<DeleteValueRequest>(stub),
        9 => check::<DeleteValueResponse>(stub),
        10 => check::<EnumKeyRequest>(stub),
        11 => check::<EnumKeyResponse>(stub),
        12 => check::<EnumValueRequest>(stub),
        13 => check::<EnumValueResponse>(stub),
        14 => check::<FlushKeyRequest>(stub),
        15 => check::<FlushKeyResponse>(stub),
        16 => check::<GetVersionRequest>(stub),
        17 => check::<GetVersionResponse>(stub),
        18 => check::<OpenKeyRequest>(stub),
        19 => check::<OpenKeyResponse>(stub),
        20 => check::<QueryInfoKeyRequest>(stub),
        21 => check::<QueryInfoKeyResponse>(stub),
        22 => check::<QueryMultipleValuesRequest>(stub),
        23 => check::<QueryMultipleValuesResponse>(stub),
        24 => check::<QueryValueRequest>(stub),
        25 => check::<QueryValueResponse>(stub),
        26 => check::<SaveKeyRequest>(stub),
        27 => check::<SaveKeyResponse>(stub),
        28 => check::<SetValueRequest>(stub),
        _ => check::<SetValueResponse>(stub),
    }
});
