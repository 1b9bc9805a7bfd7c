//! Property tests for how a scope combines body and close failures.

use proptest::prelude::*;
use winreg_core::{RegistryClient, RegistryError};
use winreg_harness::SimTransport;
use winreg_proto::{Opnum, PredefinedKey, Regsam, ReturnCode};

fn failure_code() -> impl Strategy<Value = Option<ReturnCode>> {
    prop::option::of((1u32..).prop_map(ReturnCode::new))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn body_error_then_close_error_then_value(
        body_code in failure_code(),
        close_code in failure_code(),
        seed in any::<u64>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let client = RegistryClient::new(SimTransport::with_seed(seed));
        let client = &client;
        let root = runtime
            .block_on(client.open_predefined_key(PredefinedKey::LocalMachine, Regsam::KEY_READ))
            .unwrap()
            .key_handle;

        if let Some(code) = body_code {
            client.transport().fail_next(Opnum::BaseRegGetVersion, code);
        }
        if let Some(code) = close_code {
            client.transport().fail_next(Opnum::BaseRegCloseKey, code);
        }

        let result = runtime.block_on(client.with_sub_key(
            root,
            "SOFTWARE",
            Regsam::KEY_READ,
            |opened| async move { client.get_version(opened.key_handle).await.map(|reply| reply.version) },
        ));

        let expected = match (body_code, close_code) {
            (Some(code), _) => Some((Opnum::BaseRegGetVersion, code)),
            (None, Some(code)) => Some((Opnum::BaseRegCloseKey, code)),
            (None, None) => None,
        };
        match (result, expected) {
            (Ok(version), None) => prop_assert_eq!(version, winreg_harness::SIM_REGISTRY_VERSION),
            (Err(RegistryError::OperationFailed { opnum, code }), Some(expected)) => {
                prop_assert_eq!((opnum, code), expected);
            },
            (other, expected) => prop_assert!(false, "got {:?}, expected {:?}", other, expected),
        }
        prop_assert_eq!(client.transport().calls_to(Opnum::BaseRegCloseKey).len(), 1);
    }
}
