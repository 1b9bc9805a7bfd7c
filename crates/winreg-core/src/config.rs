//! Client configuration.

use winreg_proto::Regsam;

/// Behavior knobs for a [`RegistryClient`](crate::RegistryClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whether [`call`](crate::RegistryClient::call) turns a non-zero return
    /// code into [`RegistryError::OperationFailed`](crate::RegistryError).
    pub raise_on_error: bool,

    /// Initial data buffer offered by value queries, in bytes.
    ///
    /// Values that do not fit are re-queried once at the size the server
    /// reports, up to [`max_value_size`](Self::max_value_size).
    pub query_buffer_size: u32,

    /// Largest data buffer a value query will grow to, in bytes.
    ///
    /// A server reporting a larger size gets
    /// [`RegistryError::ValueTooLarge`](crate::RegistryError::ValueTooLarge)
    /// instead of a second request.
    pub max_value_size: u32,

    /// Name buffer offered by enumeration requests, in bytes.
    ///
    /// The default holds any key name (255 UTF-16 units). Value names can
    /// reach 16 383 units; a value whose name does not fit is re-fetched once
    /// with a buffer large enough for the longest legal name.
    pub name_buffer_size: u16,

    /// Defaults for [`dump_key`](crate::dump_key).
    pub dump: DumpConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            raise_on_error: true,
            query_buffer_size: 32,
            max_value_size: 16 * 1024 * 1024,
            name_buffer_size: 1024,
            dump: DumpConfig::default(),
        }
    }
}

/// Defaults for saving a key to the server's disk and reading it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Server-side directory the hive file is written to.
    pub directory: String,

    /// Delete the hive file when the read handle is closed.
    pub delete_on_close: bool,

    /// Bytes requested per file read.
    pub read_chunk_size: u32,

    /// Access requested when opening the key to save.
    pub sam_desired: Regsam,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            directory: String::from(r"C:\Windows\Temp"),
            delete_on_close: true,
            read_chunk_size: 64 * 1024,
            sam_desired: Regsam::MAXIMUM_ALLOWED,
        }
    }
}
