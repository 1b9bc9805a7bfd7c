//! Remote registry client built on the MS-RRP wire codec.
//!
//! This crate turns the request/response catalog of [`winreg_proto`] into
//! awaitable operations against a remote registry service. It never opens a
//! socket itself: RPC delivery and file retrieval are traits the caller
//! implements over whatever SMB stack it uses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ dump_key            with_key / with_sub_key  │  composition, scoped handles
//! ├──────────────────────────────────────────────┤
//! │ RegistryClient: invoke, call, typed wrappers │  encode, raise policy, decode
//! ├──────────────────────────────────────────────┤
//! │ RpcTransport                 FileTransfer    │  caller-provided I/O
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`RegistryClient`]: One method per operation, plus `invoke` for raw
//!   request values
//! - [`scope`]: Handle scopes that close exactly once, including on error
//!   and cancellation
//! - [`dump_key`]: Save a key on the server and read the hive file back
//! - [`RpcTransport`] / [`FileTransfer`]: The I/O seams
//! - [`ClientConfig`]: Raise policy, buffer sizes and dump defaults
//!
//! # Logging
//!
//! Operations emit `tracing` events: `debug` per request and response,
//! `warn` for failures that are swallowed or leak a handle, `info` when a
//! dump completes. No subscriber is installed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod dump;
pub mod error;
pub mod files;
pub mod scope;
pub mod transport;

pub use client::{EnumeratedValue, RegistryClient};
pub use config::{ClientConfig, DumpConfig};
pub use dump::{DumpOptions, KeyDump, dump_key, share_relative_path};
pub use error::{RegistryError, Result};
pub use files::{FileOpenOptions, FileTransfer};
pub use transport::RpcTransport;
