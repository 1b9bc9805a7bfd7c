//! Transport abstraction for DCE/RPC request/response exchanges.
//!
//! The registry client never sees a socket or a named pipe. It hands a
//! finished NDR stub to an [`RpcTransport`] and gets the response stub back.
//! Production implementations sit on an SMB session bound to `\PIPE\winreg`;
//! tests use the simulated service in `winreg-harness`.

use std::{io, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use winreg_proto::InterfaceId;

/// A bound RPC channel that carries request stubs to a server.
///
/// The implementation owns everything below the stub:
/// - Binding to `interface` and authenticating
/// - Building request PDUs around `stub` and fragmenting them
/// - Reassembling the response PDU and returning its stub
///
/// One outstanding request per channel is assumed. Callers that share a
/// transport between tasks must serialize their calls or use a transport
/// that multiplexes call ids.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send one request and wait for its response stub.
    ///
    /// Returns the stub bytes of the response PDU. Faults reported by the
    /// RPC runtime (as opposed to Win32 codes inside the stub) are I/O
    /// errors.
    async fn send_request(
        &self,
        interface: &InterfaceId,
        opnum: u16,
        stub: Bytes,
    ) -> io::Result<Bytes>;
}

#[async_trait]
impl<T: RpcTransport> RpcTransport for Arc<T> {
    async fn send_request(
        &self,
        interface: &InterfaceId,
        opnum: u16,
        stub: Bytes,
    ) -> io::Result<Bytes> {
        (**self).send_request(interface, opnum, stub).await
    }
}
