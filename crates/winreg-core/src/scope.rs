//! Scoped key handles.
//!
//! Every handle-yielding operation has a scoped form that closes the handle
//! exactly once, whatever way the scope ends:
//!
//! ```text
//! open ──Ok──► body(response) ──► BaseRegCloseKey(handle)
//!   │                │
//!   │ Err            └── future dropped ──► close spawned on the runtime
//!   ▼
//! error, nothing to close
//! ```
//!
//! # Error precedence
//!
//! | body  | close | result                                  |
//! |-------|-------|-----------------------------------------|
//! | Ok    | Ok    | body value                              |
//! | Ok    | Err   | close error                             |
//! | Err   | Ok    | body error                              |
//! | Err   | Err   | body error, close error logged          |

use std::{future::Future, sync::Arc};

use tracing::warn;
use winreg_proto::{
    KeyHandle, KeyHandleResponse, PredefinedKey, Regsam, RrpRequest,
    messages::{
        CloseKeyRequest, CreateKeyRequest, CreateKeyResponse, OpenKeyRequest, OpenKeyResponse,
        OpenRootKeyResponse,
    },
};

use crate::{
    client::{RegistryClient, exchange},
    error::Result,
    transport::RpcTransport,
};

/// Closes a handle in the background if its scope is abandoned mid-flight.
struct CloseGuard<T: RpcTransport> {
    transport: Option<Arc<T>>,
    key: KeyHandle,
}

impl<T: RpcTransport> CloseGuard<T> {
    fn new(transport: Arc<T>, key: KeyHandle) -> Self {
        Self { transport: Some(transport), key }
    }

    /// The scope reached its own close; nothing left to do on drop.
    fn disarm(&mut self) {
        self.transport = None;
    }
}

impl<T: RpcTransport> Drop for CloseGuard<T> {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        let key = self.key;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(%key, "key scope dropped before completion, closing in background");
                runtime.spawn(async move {
                    let closed = exchange(&*transport, &CloseKeyRequest::new(key)).await;
                    match closed {
                        Ok(response) if response.return_code.is_success() => {},
                        Ok(response) => {
                            warn!(%key, code = %response.return_code, "background close rejected");
                        },
                        Err(error) => warn!(%key, %error, "background close failed"),
                    }
                });
            },
            Err(_) => warn!(%key, "key scope dropped outside a runtime, handle leaked"),
        }
    }
}

impl<T: RpcTransport> RegistryClient<T> {
    /// Run `body` with the handle `request` opens, then close it.
    ///
    /// The open always raises on a non-zero return code, so `body` only ever
    /// sees a live handle. See the module docs for how body and close errors
    /// combine.
    pub async fn with_key<R, F, Fut, O>(&self, request: R, body: F) -> Result<O>
    where
        R: RrpRequest,
        R::Response: KeyHandleResponse,
        F: FnOnce(R::Response) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let response = self.invoke(&request, true).await?;
        self.scoped(response, body).await
    }

    /// Run `body` with a predefined key open.
    pub async fn with_root_key<F, Fut, O>(
        &self,
        key: PredefinedKey,
        sam_desired: Regsam,
        body: F,
    ) -> Result<O>
    where
        F: FnOnce(OpenRootKeyResponse) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let response = self.open_predefined(key, sam_desired, true).await?;
        self.scoped(response, body).await
    }

    /// Run `body` with `sub_key` of `parent` open.
    pub async fn with_sub_key<F, Fut, O>(
        &self,
        parent: KeyHandle,
        sub_key: &str,
        sam_desired: Regsam,
        body: F,
    ) -> Result<O>
    where
        F: FnOnce(OpenKeyResponse) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        self.with_key(OpenKeyRequest::new(parent, sub_key).with_sam(sam_desired), body).await
    }

    /// Run `body` with a created (or opened) key.
    ///
    /// The response handed to `body` carries the disposition, so the body
    /// can tell a fresh key from an existing one before touching it.
    pub async fn with_created_key<F, Fut, O>(&self, request: CreateKeyRequest, body: F) -> Result<O>
    where
        F: FnOnce(CreateKeyResponse) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        self.with_key(request, body).await
    }

    async fn scoped<H, F, Fut, O>(&self, response: H, body: F) -> Result<O>
    where
        H: KeyHandleResponse,
        F: FnOnce(H) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let key = response.key_handle();
        let mut guard = CloseGuard::new(Arc::clone(self.transport()), key);

        let outcome = body(response).await;

        // Disarm before closing: a scope cancelled during its own close must
        // not issue a second one.
        guard.disarm();
        let closed = self.invoke(&CloseKeyRequest::new(key), true).await;

        match (outcome, closed) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(error)) | (Err(error), Ok(_)) => Err(error),
            (Err(error), Err(close_error)) => {
                warn!(%key, error = %close_error, "close failed while unwinding scope");
                Err(error)
            },
        }
    }
}

