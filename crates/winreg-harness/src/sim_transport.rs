//! Simulated remote registry service.
//!
//! [`SimTransport`] answers MS-RRP stubs in-process. It does not model a
//! registry tree; it models the parts of the service a client's correctness
//! depends on:
//!
//! - Handle lifecycle: open operations mint handles from a seeded RNG, close
//!   releases them, and misuse is recorded as a [`LifecycleViolation`]
//! - Fault injection: per-operation return codes, I/O errors and hangs
//! - Scripted replies for operations whose content matters to a test
//!
//! Every request is recorded with its stub so tests can decode exactly what
//! the client sent.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    io,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use bytes::Bytes;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use winreg_core::{RpcTransport, share_relative_path};
use winreg_proto::{
    Disposition, InterfaceId, KeyHandle, NdrDecode, NdrEncode, Opnum, ReturnCode, RrpRequest,
    RrpResponse,
    messages::{
        CloseKeyResponse, CreateKeyResponse, DeleteKeyResponse, DeleteValueResponse,
        EnumKeyResponse, EnumValueResponse, FlushKeyResponse, GetVersionResponse, OpenKeyResponse,
        OpenRootKeyResponse, QueryInfoKeyResponse, QueryMultipleValuesRequest,
        QueryMultipleValuesResponse, QueryValueResponse, SaveKeyRequest, SaveKeyResponse,
        SetValueResponse,
    },
};

use crate::memory_files::MemoryFiles;

/// Registry version `BaseRegGetVersion` reports.
pub const SIM_REGISTRY_VERSION: u32 = 6;

/// One request the simulated service received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Interface the request was bound to.
    pub interface: InterfaceId,
    /// Raw operation number.
    pub opnum: u16,
    /// Request stub.
    pub payload: Bytes,
}

impl RecordedCall {
    /// The operation, if the number is a known one.
    pub fn operation(&self) -> Option<Opnum> {
        Opnum::from_u16(self.opnum)
    }

    /// Decode the stub as request type `R`.
    pub fn decode<R: RrpRequest>(&self) -> winreg_proto::Result<R> {
        R::from_bytes(&self.payload)
    }
}

/// Handle misuse observed by the simulated service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleViolation {
    /// A handle was closed after it had already been closed.
    DoubleClose(KeyHandle),
    /// A request named a handle the service never issued.
    UnknownHandle {
        /// Operation that carried the handle.
        opnum: u16,
        /// The offending handle.
        key: KeyHandle,
    },
    /// A request named a handle that had been closed.
    UseAfterClose {
        /// Operation that carried the handle.
        opnum: u16,
        /// The offending handle.
        key: KeyHandle,
    },
}

#[derive(Debug, Clone, Copy)]
enum FaultAction {
    Code(ReturnCode),
    Io(io::ErrorKind),
}

#[derive(Debug)]
struct FaultRule {
    opnum: u16,
    action: FaultAction,
    once: bool,
}

struct SimState {
    rng: ChaCha8Rng,
    calls: Vec<RecordedCall>,
    faults: Vec<FaultRule>,
    scripted: HashMap<u16, VecDeque<Bytes>>,
    hangs: HashSet<u16>,
    open: Vec<KeyHandle>,
    closed: Vec<KeyHandle>,
    violations: Vec<LifecycleViolation>,
    save_sink: Option<(MemoryFiles, Bytes)>,
}

/// In-process MS-RRP service implementing [`RpcTransport`].
pub struct SimTransport {
    state: Mutex<SimState>,
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl std::fmt::Debug for SimTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimTransport")
            .field("calls", &state.calls.len())
            .field("open", &state.open.len())
            .field("violations", &state.violations)
            .finish_non_exhaustive()
    }
}

fn stub<R: NdrEncode>(response: &R) -> io::Result<Bytes> {
    response.to_bytes().map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn not_simulated(opnum: u16) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("operation {opnum} is not simulated"))
}

impl SimTransport {
    /// Service with RNG seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Service whose handle values derive from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                calls: Vec::new(),
                faults: Vec::new(),
                scripted: HashMap::new(),
                hangs: HashSet::new(),
                open: Vec::new(),
                closed: Vec::new(),
                violations: Vec::new(),
                save_sink: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_fault(&self, opnum: Opnum, action: FaultAction, once: bool) {
        self.lock().faults.push(FaultRule { opnum: opnum.to_u16(), action, once });
    }

    /// Answer the next `opnum` request with `code`.
    pub fn fail_next(&self, opnum: Opnum, code: ReturnCode) {
        self.add_fault(opnum, FaultAction::Code(code), true);
    }

    /// Answer every `opnum` request with `code`.
    pub fn fail_always(&self, opnum: Opnum, code: ReturnCode) {
        self.add_fault(opnum, FaultAction::Code(code), false);
    }

    /// Fail delivery of the next `opnum` request with an I/O error.
    pub fn fail_io_next(&self, opnum: Opnum, kind: io::ErrorKind) {
        self.add_fault(opnum, FaultAction::Io(kind), true);
    }

    /// Queue a reply for the next `opnum` request that no fault claims.
    pub fn respond_with<R: RrpResponse>(&self, opnum: Opnum, response: &R) -> io::Result<()> {
        let bytes = stub(response)?;
        self.lock().scripted.entry(opnum.to_u16()).or_default().push_back(bytes);
        Ok(())
    }

    /// Queue a raw reply stub, for malformed-response tests.
    pub fn respond_raw(&self, opnum: Opnum, reply: impl Into<Bytes>) {
        self.lock().scripted.entry(opnum.to_u16()).or_default().push_back(reply.into());
    }

    /// Never answer `opnum` requests.
    pub fn hang(&self, opnum: Opnum) {
        self.lock().hangs.insert(opnum.to_u16());
    }

    /// Make `BaseRegSaveKey` write `contents` into `files` at the
    /// share-relative form of the requested path.
    pub fn save_into(&self, files: &MemoryFiles, contents: impl Into<Bytes>) {
        self.lock().save_sink = Some((files.clone(), contents.into()));
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Requests received for `opnum`.
    pub fn calls_to(&self, opnum: Opnum) -> Vec<RecordedCall> {
        self.lock().calls.iter().filter(|call| call.opnum == opnum.to_u16()).cloned().collect()
    }

    /// Handles issued and not yet closed, in issue order.
    pub fn open_handles(&self) -> Vec<KeyHandle> {
        self.lock().open.clone()
    }

    /// Handles successfully closed, in close order.
    pub fn closed_handles(&self) -> Vec<KeyHandle> {
        self.lock().closed.clone()
    }

    /// Whether `key` is currently open.
    pub fn is_open(&self, key: KeyHandle) -> bool {
        self.lock().open.contains(&key)
    }

    /// Handle misuse observed so far.
    pub fn lifecycle_violations(&self) -> Vec<LifecycleViolation> {
        self.lock().violations.clone()
    }
}

impl SimState {
    fn respond(&mut self, opnum: u16, payload: &[u8]) -> io::Result<Bytes> {
        if let Some(index) = self.faults.iter().position(|rule| rule.opnum == opnum) {
            let action = self.faults[index].action;
            if self.faults[index].once {
                self.faults.remove(index);
            }
            return match action {
                FaultAction::Code(code) => failure(opnum, code),
                FaultAction::Io(kind) => Err(kind.into()),
            };
        }

        if let Some(reply) = self.scripted.get_mut(&opnum).and_then(VecDeque::pop_front) {
            return Ok(reply);
        }

        let operation = Opnum::from_u16(opnum).ok_or_else(|| not_simulated(opnum))?;
        self.default_reply(operation, payload)
    }

    fn default_reply(&mut self, operation: Opnum, payload: &[u8]) -> io::Result<Bytes> {
        let opnum = operation.to_u16();
        if operation.opens_predefined_key() {
            let key_handle = self.mint();
            return stub(&OpenRootKeyResponse { key_handle, return_code: ReturnCode::SUCCESS });
        }

        // Every other request leads with the key handle it operates on.
        let key = KeyHandle::from_bytes(payload)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        if operation == Opnum::BaseRegCloseKey {
            return self.close(key);
        }
        if let Some(violation) = self.check_handle(opnum, key) {
            debug!(opnum, %key, "request on a handle that is not open");
            self.violations.push(violation);
            return failure(opnum, ReturnCode::INVALID_HANDLE);
        }

        match operation {
            Opnum::BaseRegOpenKey => {
                let key_handle = self.mint();
                stub(&OpenKeyResponse { key_handle, return_code: ReturnCode::SUCCESS })
            },
            Opnum::BaseRegCreateKey => {
                let key_handle = self.mint();
                stub(&CreateKeyResponse {
                    key_handle,
                    disposition: Some(Disposition::CreatedNewKey),
                    return_code: ReturnCode::SUCCESS,
                })
            },
            Opnum::BaseRegEnumKey => failure(opnum, ReturnCode::NO_MORE_ITEMS),
            Opnum::BaseRegEnumValue => failure(opnum, ReturnCode::NO_MORE_ITEMS),
            Opnum::BaseRegQueryValue => failure(opnum, ReturnCode::FILE_NOT_FOUND),
            Opnum::BaseRegGetVersion => stub(&GetVersionResponse {
                version: SIM_REGISTRY_VERSION,
                return_code: ReturnCode::SUCCESS,
            }),
            Opnum::BaseRegQueryInfoKey => stub(&QueryInfoKeyResponse::default()),
            Opnum::BaseRegQueryMultipleValues => {
                let request = QueryMultipleValuesRequest::from_bytes(payload)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                stub(&QueryMultipleValuesResponse {
                    entries: request.entries,
                    buffer: Some(Vec::new()),
                    total_size: 0,
                    return_code: ReturnCode::SUCCESS,
                })
            },
            Opnum::BaseRegSaveKey => {
                let request = SaveKeyRequest::from_bytes(payload)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                if let Some((files, contents)) = &self.save_sink {
                    files.insert(share_relative_path(&request.path), contents.clone());
                }
                stub(&SaveKeyResponse::default())
            },
            Opnum::BaseRegDeleteKey => stub(&DeleteKeyResponse::default()),
            Opnum::BaseRegDeleteValue => stub(&DeleteValueResponse::default()),
            Opnum::BaseRegFlushKey => stub(&FlushKeyResponse::default()),
            Opnum::BaseRegSetValue => stub(&SetValueResponse::default()),
            _ => Err(not_simulated(opnum)),
        }
    }

    fn mint(&mut self) -> KeyHandle {
        loop {
            // Server handles carry a zero attribute word before a random GUID.
            let mut bytes = [0u8; KeyHandle::SIZE];
            self.rng.fill(&mut bytes[4..]);
            let key = KeyHandle::new(bytes);
            if !key.is_null() && !self.open.contains(&key) && !self.closed.contains(&key) {
                self.open.push(key);
                return key;
            }
        }
    }

    fn check_handle(&self, opnum: u16, key: KeyHandle) -> Option<LifecycleViolation> {
        if self.open.contains(&key) {
            None
        } else if self.closed.contains(&key) {
            Some(LifecycleViolation::UseAfterClose { opnum, key })
        } else {
            Some(LifecycleViolation::UnknownHandle { opnum, key })
        }
    }

    fn close(&mut self, key: KeyHandle) -> io::Result<Bytes> {
        let opnum = Opnum::BaseRegCloseKey.to_u16();
        if let Some(index) = self.open.iter().position(|open| *open == key) {
            self.open.remove(index);
            self.closed.push(key);
            return stub(&CloseKeyResponse::default());
        }

        let violation = if self.closed.contains(&key) {
            LifecycleViolation::DoubleClose(key)
        } else {
            LifecycleViolation::UnknownHandle { opnum, key }
        };
        debug!(%key, ?violation, "rejected close");
        self.violations.push(violation);
        stub(&CloseKeyResponse { key_handle: key, return_code: ReturnCode::INVALID_HANDLE })
    }
}

/// A response of the right shape for `opnum` carrying `code`.
fn failure(opnum: u16, code: ReturnCode) -> io::Result<Bytes> {
    let operation = Opnum::from_u16(opnum).ok_or_else(|| not_simulated(opnum))?;
    if operation.opens_predefined_key() {
        return stub(&OpenRootKeyResponse { return_code: code, ..Default::default() });
    }
    match operation {
        Opnum::BaseRegCloseKey => stub(&CloseKeyResponse { return_code: code, ..Default::default() }),
        Opnum::BaseRegOpenKey => stub(&OpenKeyResponse { return_code: code, ..Default::default() }),
        Opnum::BaseRegCreateKey => {
            stub(&CreateKeyResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegEnumKey => stub(&EnumKeyResponse { return_code: code, ..Default::default() }),
        Opnum::BaseRegEnumValue => {
            stub(&EnumValueResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegQueryValue => {
            stub(&QueryValueResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegGetVersion => {
            stub(&GetVersionResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegQueryInfoKey => {
            stub(&QueryInfoKeyResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegQueryMultipleValues => {
            stub(&QueryMultipleValuesResponse { return_code: code, ..Default::default() })
        },
        Opnum::BaseRegSaveKey => stub(&SaveKeyResponse { return_code: code }),
        Opnum::BaseRegDeleteKey => stub(&DeleteKeyResponse { return_code: code }),
        Opnum::BaseRegDeleteValue => stub(&DeleteValueResponse { return_code: code }),
        Opnum::BaseRegFlushKey => stub(&FlushKeyResponse { return_code: code }),
        Opnum::BaseRegSetValue => stub(&SetValueResponse { return_code: code }),
        _ => Err(not_simulated(opnum)),
    }
}

#[async_trait]
impl RpcTransport for SimTransport {
    async fn send_request(
        &self,
        interface: &InterfaceId,
        opnum: u16,
        stub: Bytes,
    ) -> io::Result<Bytes> {
        let reply = {
            let mut state = self.lock();
            state.calls.push(RecordedCall { interface: *interface, opnum, payload: stub.clone() });
            if state.hangs.contains(&opnum) {
                None
            } else {
                Some(state.respond(opnum, &stub))
            }
        };

        match reply {
            Some(reply) => reply,
            None => {
                debug!(opnum, "holding request forever");
                std::future::pending().await
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use winreg_proto::{
        MS_RRP_INTERFACE, Regsam,
        messages::{CloseKeyRequest, OpenKeyRequest, OpenLocalMachineRequest},
    };

    use super::*;

    async fn send<R: RrpRequest>(sim: &SimTransport, request: &R) -> R::Response {
        let reply = sim
            .send_request(&MS_RRP_INTERFACE, R::OPNUM.to_u16(), request.to_bytes().unwrap())
            .await
            .unwrap();
        R::Response::from_bytes(&reply).unwrap()
    }

    #[tokio::test]
    async fn handles_are_seeded_and_tracked() {
        let first = SimTransport::with_seed(7);
        let second = SimTransport::with_seed(7);
        let a = send(&first, &OpenLocalMachineRequest::new(Regsam::KEY_READ)).await;
        let b = send(&second, &OpenLocalMachineRequest::new(Regsam::KEY_READ)).await;

        assert_eq!(a.key_handle, b.key_handle);
        assert_eq!(&a.key_handle.as_array()[..4], [0; 4]);
        assert_eq!(first.open_handles(), [a.key_handle]);

        let closed = send(&first, &CloseKeyRequest::new(a.key_handle)).await;
        assert!(closed.return_code.is_success());
        assert!(closed.key_handle.is_null());
        assert!(first.open_handles().is_empty());
        assert!(first.lifecycle_violations().is_empty());
    }

    #[tokio::test]
    async fn double_close_is_a_violation() {
        let sim = SimTransport::new();
        let root = send(&sim, &OpenLocalMachineRequest::default()).await.key_handle;
        send(&sim, &CloseKeyRequest::new(root)).await;

        let again = send(&sim, &CloseKeyRequest::new(root)).await;

        assert_eq!(again.return_code, ReturnCode::INVALID_HANDLE);
        assert_eq!(sim.lifecycle_violations(), [LifecycleViolation::DoubleClose(root)]);
    }

    #[tokio::test]
    async fn use_of_unknown_handle_is_a_violation() {
        let sim = SimTransport::new();
        let bogus = KeyHandle::new([9; 20]);

        let response = send(&sim, &OpenKeyRequest::new(bogus, "Software")).await;

        assert_eq!(response.return_code, ReturnCode::INVALID_HANDLE);
        assert!(matches!(
            sim.lifecycle_violations()[..],
            [LifecycleViolation::UnknownHandle { opnum: 15, .. }]
        ));
    }

    #[tokio::test]
    async fn one_shot_faults_apply_once() {
        let sim = SimTransport::new();
        sim.fail_next(Opnum::OpenLocalMachine, ReturnCode::ACCESS_DENIED);

        let denied = send(&sim, &OpenLocalMachineRequest::default()).await;
        let granted = send(&sim, &OpenLocalMachineRequest::default()).await;

        assert_eq!(denied.return_code, ReturnCode::ACCESS_DENIED);
        assert!(denied.key_handle.is_null());
        assert!(granted.return_code.is_success());
        assert_eq!(sim.open_handles().len(), 1);
        assert_eq!(sim.calls().len(), 2);
    }
}
