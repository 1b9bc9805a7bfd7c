//! Deterministic test harness for remote registry clients.
//!
//! In-process implementations of the `RpcTransport` and `FileTransfer`
//! seams of `winreg-core`, so client behavior (handle lifecycles, error
//! propagation, cancellation, dumps) can be tested without a Windows host.
//! Handle values come from a seeded RNG, so runs are reproducible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod memory_files;
pub mod sim_transport;

pub use memory_files::{MemoryFile, MemoryFiles};
pub use sim_transport::{LifecycleViolation, RecordedCall, SIM_REGISTRY_VERSION, SimTransport};
