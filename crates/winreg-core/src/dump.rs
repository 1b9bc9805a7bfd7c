//! Dumping a key to a hive file and reading it back.
//!
//! `BaseRegSaveKey` can only write to the server's own disk, so a dump takes
//! two channels:
//!
//! 1. Open the key (scoped) and save it to a file on the server.
//! 2. Read the file back through a [`FileTransfer`], usually SMB on an
//!    administrative share, and close it (deleting it by default).

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};
use uuid::Uuid;
use winreg_proto::{KeyHandle, KeyHandleResponse, Regsam, messages::SaveKeyRequest};

use crate::{
    client::RegistryClient,
    config::DumpConfig,
    error::{RegistryError, Result},
    files::{FileOpenOptions, FileTransfer},
    transport::RpcTransport,
};

/// Per-dump overrides of [`DumpConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Server-side file to save to. Defaults to a random name in the
    /// configured directory.
    pub save_path: Option<String>,
    /// Access requested on the key being saved.
    pub sam_desired: Option<Regsam>,
    /// Delete the file after it has been read.
    pub delete_on_close: Option<bool>,
}

/// A saved key and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDump {
    /// Server-side path the hive was saved to.
    pub path: String,
    /// Hive file contents.
    pub data: Bytes,
}

/// Save `sub_key` of `root` on the server and read the hive file back.
///
/// The key handle is closed before the file is fetched; the file is closed
/// whether or not reading it succeeded.
pub async fn dump_key<T, F>(
    client: &RegistryClient<T>,
    files: &F,
    root: KeyHandle,
    sub_key: &str,
    options: DumpOptions,
) -> Result<KeyDump>
where
    T: RpcTransport,
    F: FileTransfer,
{
    let defaults: &DumpConfig = &client.config().dump;
    let path = options.save_path.unwrap_or_else(|| random_save_path(&defaults.directory));
    let sam_desired = options.sam_desired.unwrap_or(defaults.sam_desired);
    let delete_on_close = options.delete_on_close.unwrap_or(defaults.delete_on_close);

    let save_to = path.as_str();
    client
        .with_sub_key(root, sub_key, sam_desired, |opened| async move {
            client.invoke(&SaveKeyRequest::new(opened.key_handle(), save_to), true).await
        })
        .await?;
    debug!(sub_key, %path, "key saved on server");

    let relative = share_relative_path(&path);
    let mut file = match files.open(relative, FileOpenOptions { delete_on_close }).await {
        Ok(file) => file,
        Err(error) => {
            warn!(%path, %error, "hive saved but could not be opened, file left on server");
            return Err(RegistryError::FileTransfer(error));
        },
    };

    let read = read_to_end(files, &mut file, defaults.read_chunk_size).await;
    let closed = files.close(file).await.map_err(RegistryError::FileTransfer);

    let data = match (read, closed) {
        (Ok(data), Ok(())) => data,
        (Ok(_), Err(error)) | (Err(error), Ok(())) => return Err(error),
        (Err(error), Err(close_error)) => {
            warn!(%path, error = %close_error, "closing hive file failed after read error");
            return Err(error);
        },
    };

    info!(sub_key, %path, bytes = data.len(), "dumped registry key");
    Ok(KeyDump { path, data })
}

async fn read_to_end<F: FileTransfer>(files: &F, file: &mut F::File, chunk_size: u32) -> Result<Bytes> {
    let mut data = BytesMut::new();
    loop {
        let chunk = files.read(file, chunk_size).await.map_err(RegistryError::FileTransfer)?;
        if chunk.is_empty() {
            return Ok(data.freeze());
        }
        data.extend_from_slice(&chunk);
    }
}

fn random_save_path(directory: &str) -> String {
    format!("{}\\{}", directory.trim_end_matches('\\'), Uuid::new_v4())
}

/// Path of `path` relative to the root of its drive's share.
///
/// `C:\Windows\Temp\x` becomes `Windows\Temp\x`. Paths without a drive only
/// lose their leading separators.
pub fn share_relative_path(path: &str) -> &str {
    let mut chars = path.chars();
    let rest = match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => chars.as_str(),
        _ => path,
    };
    rest.trim_start_matches(['\\', '/'])
}
