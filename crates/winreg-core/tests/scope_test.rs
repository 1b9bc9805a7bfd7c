//! Handle scopes against the simulated registry service.
//!
//! Every scope must issue exactly one close for the handle it opened, on
//! success, on error and on cancellation, and must combine body and close
//! errors in a fixed order.

use std::time::Duration;

use winreg_core::{RegistryClient, RegistryError};
use winreg_harness::{LifecycleViolation, SimTransport};
use winreg_proto::{
    Disposition, KeyHandle, Opnum, PredefinedKey, RegOptions, Regsam, ReturnCode,
    messages::{CloseKeyRequest, CreateKeyRequest, OpenKeyRequest},
};

async fn client_with_root() -> (RegistryClient<SimTransport>, KeyHandle) {
    let client = RegistryClient::new(SimTransport::with_seed(42));
    let root = client
        .open_predefined_key(PredefinedKey::LocalMachine, Regsam::KEY_READ)
        .await
        .unwrap()
        .key_handle;
    (client, root)
}

fn closed_keys(sim: &SimTransport) -> Vec<KeyHandle> {
    sim.calls_to(Opnum::BaseRegCloseKey)
        .iter()
        .map(|call| call.decode::<CloseKeyRequest>().unwrap().key_handle)
        .collect()
}

#[tokio::test]
async fn successful_scope_closes_its_handle_once() {
    let (client, root) = client_with_root().await;
    let client = &client;

    let (key, version) = client
        .with_sub_key(root, "SOFTWARE", Regsam::KEY_READ, |opened| async move {
            let key = opened.key_handle;
            let version = client.get_version(key).await?.version;
            Ok((key, version))
        })
        .await
        .unwrap();

    assert_eq!(version, winreg_harness::SIM_REGISTRY_VERSION);
    assert_eq!(closed_keys(client.transport()), [key]);
    assert_eq!(client.transport().open_handles(), [root]);
    assert!(client.transport().lifecycle_violations().is_empty());
}

#[tokio::test]
async fn body_error_still_closes() {
    let (client, root) = client_with_root().await;
    let client = &client;

    let err = client
        .with_sub_key(root, "SYSTEM", Regsam::KEY_READ, |opened| async move {
            client.query_value(opened.key_handle, "Missing").await.map(drop)
        })
        .await
        .unwrap_err();

    assert_eq!(err.return_code(), Some(ReturnCode::FILE_NOT_FOUND));
    assert_eq!(err.opnum(), Some(Opnum::BaseRegQueryValue));
    assert_eq!(closed_keys(client.transport()).len(), 1);
    assert_eq!(client.transport().open_handles(), [root]);
}

#[tokio::test]
async fn failed_open_runs_no_body_and_sends_no_close() {
    let (client, root) = client_with_root().await;
    let client = &client;
    client.transport().fail_next(Opnum::BaseRegOpenKey, ReturnCode::FILE_NOT_FOUND);

    let mut ran = false;
    let err = client
        .with_key(OpenKeyRequest::new(root, "Nope"), |_| {
            ran = true;
            async { Ok(()) }
        })
        .await
        .unwrap_err();

    assert!(!ran);
    assert!(matches!(
        err,
        RegistryError::OperationFailed { opnum: Opnum::BaseRegOpenKey, code: ReturnCode::FILE_NOT_FOUND }
    ));
    assert!(closed_keys(client.transport()).is_empty());
}

#[tokio::test]
async fn close_error_surfaces_when_body_succeeds() {
    let (client, root) = client_with_root().await;
    let client = &client;
    client.transport().fail_next(Opnum::BaseRegCloseKey, ReturnCode::ACCESS_DENIED);

    let err = client
        .with_sub_key(root, "SOFTWARE", Regsam::KEY_READ, |_| async { Ok(()) })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::OperationFailed { opnum: Opnum::BaseRegCloseKey, code: ReturnCode::ACCESS_DENIED }
    ));
}

#[tokio::test]
async fn body_error_wins_over_close_error() {
    let (client, root) = client_with_root().await;
    let client = &client;
    client.transport().fail_next(Opnum::BaseRegCloseKey, ReturnCode::ACCESS_DENIED);

    let err = client
        .with_sub_key(root, "SOFTWARE", Regsam::KEY_READ, |opened| async move {
            client.delete_key(opened.key_handle, "Child").await?;
            Err::<(), _>(RegistryError::OperationFailed {
                opnum: Opnum::BaseRegDeleteKey,
                code: ReturnCode::KEY_HAS_CHILDREN,
            })
        })
        .await
        .unwrap_err();

    assert_eq!(err.return_code(), Some(ReturnCode::KEY_HAS_CHILDREN));
    assert_eq!(closed_keys(client.transport()).len(), 1);
}

#[tokio::test]
async fn nested_scopes_close_inner_first() {
    let (client, root) = client_with_root().await;
    let client = &client;

    let (outer, inner) = client
        .with_sub_key(root, "SOFTWARE", Regsam::KEY_READ, |software| async move {
            let outer = software.key_handle;
            client
                .with_sub_key(outer, "Microsoft", Regsam::KEY_READ, |microsoft| async move {
                    Ok((outer, microsoft.key_handle))
                })
                .await
        })
        .await
        .unwrap();

    assert_eq!(closed_keys(client.transport()), [inner, outer]);
    assert!(client.transport().lifecycle_violations().is_empty());
}

#[tokio::test]
async fn created_key_disposition_reaches_the_body() {
    let (client, root) = client_with_root().await;
    let client = &client;
    let request = CreateKeyRequest::new(root, r"SOFTWARE\Scratch").with_options(RegOptions::VOLATILE);

    let disposition = client
        .with_created_key(request, |created| async move { Ok(created.disposition) })
        .await
        .unwrap();

    assert_eq!(disposition, Some(Disposition::CreatedNewKey));
    assert_eq!(closed_keys(client.transport()).len(), 1);
}

#[tokio::test]
async fn root_key_scope_closes_the_root() {
    let client = RegistryClient::new(SimTransport::new());

    let key = client
        .with_root_key(PredefinedKey::Users, Regsam::KEY_READ, |opened| async move {
            Ok(opened.key_handle)
        })
        .await
        .unwrap();

    assert_eq!(closed_keys(client.transport()), [key]);
    assert!(client.transport().open_handles().is_empty());
    let opens = client.transport().calls_to(Opnum::OpenUsers);
    assert_eq!(opens.len(), 1);
}

#[tokio::test]
async fn cancelled_scope_closes_in_background() {
    let (client, root) = client_with_root().await;
    let client = &client;
    client.transport().hang(Opnum::BaseRegQueryInfoKey);

    let scope = client.with_sub_key(root, "SAM", Regsam::KEY_READ, |opened| async move {
        client.query_info_key(opened.key_handle).await.map(drop)
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(20), scope).await;
    assert!(timed_out.is_err());

    for _ in 0..100 {
        if client.transport().open_handles() == [root] {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(client.transport().open_handles(), [root]);
    assert_eq!(closed_keys(client.transport()).len(), 1);
    assert!(client.transport().lifecycle_violations().is_empty());
}

#[test]
fn scope_dropped_without_runtime_leaks_the_handle() {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let client = RegistryClient::new(SimTransport::new());
    let root = runtime
        .block_on(client.open_predefined_key(PredefinedKey::LocalMachine, Regsam::KEY_READ))
        .unwrap()
        .key_handle;
    client.transport().hang(Opnum::BaseRegGetVersion);
    let client = &client;

    let mut scope = Box::pin(client.with_sub_key(root, "SYSTEM", Regsam::KEY_READ, |opened| async move {
        client.get_version(opened.key_handle).await.map(drop)
    }));
    let timed_out =
        runtime.block_on(async { tokio::time::timeout(Duration::from_millis(10), scope.as_mut()).await });
    assert!(timed_out.is_err());

    drop(runtime);
    drop(scope);

    assert!(client.transport().calls_to(Opnum::BaseRegCloseKey).is_empty());
    assert_eq!(client.transport().open_handles().len(), 2);
}

#[tokio::test]
async fn closing_twice_is_reported_by_the_service() {
    let (client, root) = client_with_root().await;
    let client = &client;

    client.close_key(root).await.unwrap();
    let err = client.close_key(root).await.unwrap_err();

    assert_eq!(err.return_code(), Some(ReturnCode::INVALID_HANDLE));
    assert_eq!(client.transport().lifecycle_violations(), [LifecycleViolation::DoubleClose(root)]);
}
