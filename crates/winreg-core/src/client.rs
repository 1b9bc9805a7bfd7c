//! Operation invoker and typed wrappers for every supported operation.
//!
//! [`RegistryClient::invoke`] is the single path from a request value to a
//! typed response:
//!
//! ```text
//! request ──encode──► stub ──send_request(MS_RRP_INTERFACE, opnum)──► stub
//!                                                                      │
//!                       Ok(response) ◄── return code check ◄── decode ─┘
//! ```
//!
//! The wrappers below it only build requests and pick the raise policy.
//! None of them closes the handles they return; scoped access lives in
//! [`scope`](crate::scope).

use std::sync::Arc;

use tracing::{debug, warn};
use winreg_proto::{
    KeyHandle, MS_RRP_INTERFACE, NdrDecode, NdrEncode, Opnum, PredefinedKey, RegistryValue, Regsam,
    ReturnCode, RrpRequest, RrpResponse, ValueType,
    messages::{
        CloseKeyRequest, CloseKeyResponse, CreateKeyRequest, CreateKeyResponse, DeleteKeyRequest,
        DeleteKeyResponse, DeleteValueRequest, DeleteValueResponse, EnumKeyRequest,
        EnumKeyResponse, EnumValueRequest, EnumValueResponse, FlushKeyRequest, FlushKeyResponse,
        GetVersionRequest, GetVersionResponse, OpenClassesRootRequest, OpenCurrentConfigRequest,
        OpenCurrentUserRequest, OpenKeyRequest, OpenKeyResponse, OpenLocalMachineRequest,
        OpenPerformanceDataRequest, OpenPerformanceNlsTextRequest, OpenPerformanceTextRequest,
        OpenRootKeyRequest, OpenRootKeyResponse, OpenUsersRequest, QueryInfoKeyRequest,
        QueryInfoKeyResponse, QueryMultipleValuesRequest, QueryMultipleValuesResponse,
        QueryValueRequest, QueryValueResponse, RootKey, SaveKeyRequest, SaveKeyResponse,
        SetValueRequest, SetValueResponse,
    },
};

use crate::{
    config::ClientConfig,
    error::{RegistryError, Result},
    transport::RpcTransport,
};

/// Class buffer offered by `BaseRegQueryInfoKey`, in bytes.
const CLASS_BUFFER_SIZE: u16 = 256;

/// Name buffer that fits the longest legal value name (16 383 UTF-16 units
/// plus the terminator), in bytes.
const MAX_VALUE_NAME_BUFFER: u16 = 32_768;

/// MS-RRP client over an [`RpcTransport`].
///
/// Cheap to clone; clones share the transport.
pub struct RegistryClient<T> {
    transport: Arc<T>,
    config: ClientConfig,
}

impl<T> Clone for RegistryClient<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport), config: self.config.clone() }
    }
}

impl<T> std::fmt::Debug for RegistryClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient").field("config", &self.config).finish_non_exhaustive()
    }
}

/// One value returned by [`RegistryClient::enum_values`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedValue {
    /// Value name; empty for the key's default value.
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
    /// Raw payload.
    pub data: Vec<u8>,
}

impl EnumeratedValue {
    /// Interpret the payload according to its declared type.
    pub fn value(&self) -> winreg_proto::Result<RegistryValue> {
        RegistryValue::parse(self.value_type, &self.data)
    }
}

/// Send `request` and decode its response, leaving the return code alone.
pub(crate) async fn exchange<T, R>(transport: &T, request: &R) -> Result<R::Response>
where
    T: RpcTransport + ?Sized,
    R: RrpRequest,
{
    let opnum = R::OPNUM;
    let stub = request.to_bytes().map_err(|source| RegistryError::Encode { opnum, source })?;
    debug!(%opnum, stub_len = stub.len(), "sending request");

    let reply = transport
        .send_request(&MS_RRP_INTERFACE, opnum.to_u16(), stub)
        .await
        .map_err(RegistryError::Transport)?;

    let response =
        R::Response::from_bytes(&reply).map_err(|source| RegistryError::Decode { opnum, source })?;
    debug!(%opnum, stub_len = reply.len(), code = %response.return_code(), "received response");
    Ok(response)
}

/// Apply the raise policy to a decoded response.
fn settle<R: RrpResponse>(opnum: Opnum, response: R, raise_on_error: bool) -> Result<R> {
    let code = response.return_code();
    if code.is_success() {
        return Ok(response);
    }
    if raise_on_error {
        return Err(RegistryError::OperationFailed { opnum, code });
    }
    warn!(%opnum, %code, "operation failed, returning response to caller");
    Ok(response)
}

impl<T: RpcTransport> RegistryClient<T> {
    /// Client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Client with an explicit configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    /// Client over a transport that is already shared.
    pub fn from_shared(transport: Arc<T>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Perform one operation.
    ///
    /// With `raise_on_error`, a non-zero return code becomes
    /// [`RegistryError::OperationFailed`]; otherwise the response is returned
    /// as-is for the caller to inspect.
    pub async fn invoke<R: RrpRequest>(
        &self,
        request: &R,
        raise_on_error: bool,
    ) -> Result<R::Response> {
        let response = exchange(&*self.transport, request).await?;
        settle(R::OPNUM, response, raise_on_error)
    }

    /// Perform one operation with the configured raise policy.
    pub async fn call<R: RrpRequest>(&self, request: &R) -> Result<R::Response> {
        self.invoke(request, self.config.raise_on_error).await
    }

    /// Open a predefined key chosen at compile time.
    pub async fn open_root_key<K: RootKey>(&self, sam_desired: Regsam) -> Result<OpenRootKeyResponse> {
        self.call(&OpenRootKeyRequest::<K>::new(sam_desired)).await
    }

    /// Open a predefined key chosen at runtime.
    pub async fn open_predefined_key(
        &self,
        key: PredefinedKey,
        sam_desired: Regsam,
    ) -> Result<OpenRootKeyResponse> {
        self.open_predefined(key, sam_desired, self.config.raise_on_error).await
    }

    pub(crate) async fn open_predefined(
        &self,
        key: PredefinedKey,
        sam: Regsam,
        raise: bool,
    ) -> Result<OpenRootKeyResponse> {
        match key {
            PredefinedKey::ClassesRoot => self.invoke(&OpenClassesRootRequest::new(sam), raise).await,
            PredefinedKey::CurrentUser => self.invoke(&OpenCurrentUserRequest::new(sam), raise).await,
            PredefinedKey::LocalMachine => {
                self.invoke(&OpenLocalMachineRequest::new(sam), raise).await
            },
            PredefinedKey::PerformanceData => {
                self.invoke(&OpenPerformanceDataRequest::new(sam), raise).await
            },
            PredefinedKey::Users => self.invoke(&OpenUsersRequest::new(sam), raise).await,
            PredefinedKey::CurrentConfig => {
                self.invoke(&OpenCurrentConfigRequest::new(sam), raise).await
            },
            PredefinedKey::PerformanceText => {
                self.invoke(&OpenPerformanceTextRequest::new(sam), raise).await
            },
            PredefinedKey::PerformanceNlsText => {
                self.invoke(&OpenPerformanceNlsTextRequest::new(sam), raise).await
            },
        }
    }

    /// Open `sub_key` below `key`.
    pub async fn open_key(
        &self,
        key: KeyHandle,
        sub_key: &str,
        sam_desired: Regsam,
    ) -> Result<OpenKeyResponse> {
        self.call(&OpenKeyRequest::new(key, sub_key).with_sam(sam_desired)).await
    }

    /// Create or open a key.
    pub async fn create_key(&self, request: &CreateKeyRequest) -> Result<CreateKeyResponse> {
        self.call(request).await
    }

    /// Release a handle.
    pub async fn close_key(&self, key: KeyHandle) -> Result<CloseKeyResponse> {
        self.call(&CloseKeyRequest::new(key)).await
    }

    /// Delete the childless `sub_key` below `key`.
    pub async fn delete_key(&self, key: KeyHandle, sub_key: &str) -> Result<DeleteKeyResponse> {
        self.call(&DeleteKeyRequest::new(key, sub_key)).await
    }

    /// Delete a named value.
    pub async fn delete_value(&self, key: KeyHandle, name: &str) -> Result<DeleteValueResponse> {
        self.call(&DeleteValueRequest::new(key, name)).await
    }

    /// Fetch the sub-key at `index`.
    pub async fn enum_key(&self, key: KeyHandle, index: u32) -> Result<EnumKeyResponse> {
        self.call(&EnumKeyRequest::new(key, index, self.config.name_buffer_size)).await
    }

    /// Fetch the value at `index`, offering the configured data buffer.
    pub async fn enum_value(&self, key: KeyHandle, index: u32) -> Result<EnumValueResponse> {
        let request = EnumValueRequest::new(
            key,
            index,
            self.config.name_buffer_size,
            self.config.query_buffer_size,
        );
        self.call(&request).await
    }

    /// Commit a key's changes to disk.
    pub async fn flush_key(&self, key: KeyHandle) -> Result<FlushKeyResponse> {
        self.call(&FlushKeyRequest { key_handle: key }).await
    }

    /// Query the server's registry version.
    pub async fn get_version(&self, key: KeyHandle) -> Result<GetVersionResponse> {
        self.call(&GetVersionRequest { key_handle: key }).await
    }

    /// Query a key's class, counts and limits.
    pub async fn query_info_key(&self, key: KeyHandle) -> Result<QueryInfoKeyResponse> {
        self.call(&QueryInfoKeyRequest::new(key, CLASS_BUFFER_SIZE)).await
    }

    /// Read a value.
    ///
    /// The first request offers the configured buffer. If the server answers
    /// `ERROR_MORE_DATA`, the request is repeated once with the size it
    /// reported.
    pub async fn query_value(&self, key: KeyHandle, name: &str) -> Result<QueryValueResponse> {
        let response = self.negotiate_query(key, name).await?;
        settle(Opnum::BaseRegQueryValue, response, self.config.raise_on_error)
    }

    /// Read a value and interpret it by its declared type.
    ///
    /// Always raises on a non-zero return code.
    pub async fn query_typed_value(&self, key: KeyHandle, name: &str) -> Result<RegistryValue> {
        let response = settle(Opnum::BaseRegQueryValue, self.negotiate_query(key, name).await?, true)?;
        RegistryValue::parse(response.value_type(), response.value()).map_err(|source| {
            RegistryError::Decode { opnum: Opnum::BaseRegQueryValue, source }
        })
    }

    async fn negotiate_query(&self, key: KeyHandle, name: &str) -> Result<QueryValueResponse> {
        let request = QueryValueRequest::new(key, name, self.config.query_buffer_size);
        let response = exchange(&*self.transport, &request).await?;
        if response.return_code != ReturnCode::MORE_DATA {
            return Ok(response);
        }
        let needed = self.checked_size(Opnum::BaseRegQueryValue, response.required_size())?;
        debug!(value = name, needed, "value larger than query buffer, resizing");
        exchange(&*self.transport, &QueryValueRequest::new(key, name, needed)).await
    }

    /// Read several values in one round trip.
    ///
    /// Like [`query_value`](Self::query_value), an `ERROR_MORE_DATA` answer
    /// is retried once at the total size the server reported.
    pub async fn query_multiple_values(
        &self,
        key: KeyHandle,
        names: &[&str],
    ) -> Result<QueryMultipleValuesResponse> {
        let initial = self.config.query_buffer_size;
        let request = QueryMultipleValuesRequest::new(key, names.iter().copied(), initial);
        let mut response = exchange(&*self.transport, &request).await?;
        if response.return_code == ReturnCode::MORE_DATA {
            let needed = self.checked_size(Opnum::BaseRegQueryMultipleValues, response.total_size)?;
            debug!(count = names.len(), needed, "values larger than query buffer, resizing");
            let request = QueryMultipleValuesRequest::new(key, names.iter().copied(), needed);
            response = exchange(&*self.transport, &request).await?;
        }
        settle(Opnum::BaseRegQueryMultipleValues, response, self.config.raise_on_error)
    }

    /// Save `key` and its subtree to `path` on the server.
    pub async fn save_key(&self, key: KeyHandle, path: &str) -> Result<SaveKeyResponse> {
        self.call(&SaveKeyRequest::new(key, path)).await
    }

    /// Write a typed value.
    pub async fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        value: &RegistryValue,
    ) -> Result<SetValueResponse> {
        self.call(&SetValueRequest::from_value(key, name, value)).await
    }

    /// Names of every sub-key of `key`, in server order.
    ///
    /// Enumeration stops at `ERROR_NO_MORE_ITEMS`; any other failure is
    /// raised regardless of the configured policy.
    pub async fn enum_sub_keys(&self, key: KeyHandle) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for index in 0_u32.. {
            let request = EnumKeyRequest::new(key, index, self.config.name_buffer_size);
            let response = exchange(&*self.transport, &request).await?;
            match response.return_code {
                ReturnCode::SUCCESS => names.push(response.name),
                ReturnCode::NO_MORE_ITEMS => break,
                code => return Err(RegistryError::OperationFailed { opnum: Opnum::BaseRegEnumKey, code }),
            }
        }
        debug!(%key, count = names.len(), "enumerated sub-keys");
        Ok(names)
    }

    /// Every value of `key`, in server order.
    ///
    /// A value that does not fit the configured buffers is re-fetched once,
    /// with the data buffer at the size the server reported and the name
    /// buffer at its maximum.
    pub async fn enum_values(&self, key: KeyHandle) -> Result<Vec<EnumeratedValue>> {
        let initial_name = self.config.name_buffer_size;
        let initial_data = self.config.query_buffer_size;
        let mut values = Vec::new();
        for index in 0_u32.. {
            let mut response = self.fetch_value(key, index, initial_name, initial_data).await?;
            if response.return_code == ReturnCode::MORE_DATA {
                let reported = response.data_size.unwrap_or_default();
                let data = self.checked_size(Opnum::BaseRegEnumValue, reported)?.max(initial_data);
                let name = initial_name.max(MAX_VALUE_NAME_BUFFER);
                debug!(%key, index, data, name, "value larger than enumeration buffers, resizing");
                response = self.fetch_value(key, index, name, data).await?;
            }
            match response.return_code {
                ReturnCode::SUCCESS => values.push(EnumeratedValue {
                    value_type: response.value_type(),
                    data: response.value().to_vec(),
                    name: response.name,
                }),
                ReturnCode::NO_MORE_ITEMS => break,
                code => {
                    return Err(RegistryError::OperationFailed { opnum: Opnum::BaseRegEnumValue, code });
                },
            }
        }
        debug!(%key, count = values.len(), "enumerated values");
        Ok(values)
    }

    async fn fetch_value(
        &self,
        key: KeyHandle,
        index: u32,
        name_capacity: u16,
        data_capacity: u32,
    ) -> Result<EnumValueResponse> {
        let request = EnumValueRequest::new(key, index, name_capacity, data_capacity);
        exchange(&*self.transport, &request).await
    }

    /// Refuse to grow a value buffer past the configured limit.
    fn checked_size(&self, opnum: Opnum, requested: u32) -> Result<u32> {
        let limit = self.config.max_value_size;
        if requested > limit {
            warn!(%opnum, requested, limit, "server reported a value above the buffer limit");
            return Err(RegistryError::ValueTooLarge { opnum, requested, limit });
        }
        Ok(requested)
    }
}
