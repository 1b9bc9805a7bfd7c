//! File retrieval abstraction used to fetch saved hives.
//!
//! `BaseRegSaveKey` writes a hive to the server's disk. Getting the bytes
//! back is a separate channel, normally SMB reads on an administrative share.
//! [`FileTransfer`] is the seam for that channel.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;

/// How a remote file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileOpenOptions {
    /// Remove the file once the last handle to it is closed.
    pub delete_on_close: bool,
}

/// Byte-level read access to files on the remote host.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// An open remote file.
    type File: Send;

    /// Open `path`, relative to the share root, for reading.
    async fn open(&self, path: &str, options: FileOpenOptions) -> io::Result<Self::File>;

    /// Read up to `length` bytes from the current position.
    ///
    /// An empty result marks end of file.
    async fn read(&self, file: &mut Self::File, length: u32) -> io::Result<Bytes>;

    /// Close the file, deleting it if it was opened delete-on-close.
    async fn close(&self, file: Self::File) -> io::Result<()>;
}
