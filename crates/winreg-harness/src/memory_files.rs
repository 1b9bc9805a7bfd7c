//! In-memory stand-in for the share a saved hive is read from.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use bytes::Bytes;
use winreg_core::{FileOpenOptions, FileTransfer};

/// A file share backed by a map of paths to contents.
///
/// Clones share the same files, so a test can hand one clone to the code
/// under test and inspect the other afterwards. Paths compare
/// case-insensitively, as they do on an SMB share.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    inner: Arc<Mutex<FilesState>>,
}

#[derive(Debug, Default)]
struct FilesState {
    files: HashMap<String, Bytes>,
    opened: Vec<(String, FileOpenOptions)>,
    open_count: usize,
    open_fault: Option<io::ErrorKind>,
    read_fault: Option<io::ErrorKind>,
}

/// An open file in a [`MemoryFiles`] share.
#[derive(Debug)]
pub struct MemoryFile {
    path: String,
    data: Bytes,
    position: usize,
    delete_on_close: bool,
}

fn normalize(path: &str) -> String {
    path.replace('/', "\\").to_ascii_lowercase()
}

impl MemoryFiles {
    /// An empty share.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FilesState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a file.
    pub fn insert(&self, path: &str, contents: impl Into<Bytes>) {
        self.lock().files.insert(normalize(path), contents.into());
    }

    /// Whether `path` exists.
    pub fn contains(&self, path: &str) -> bool {
        self.lock().files.contains_key(&normalize(path))
    }

    /// Current contents of `path`.
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        self.lock().files.get(&normalize(path)).cloned()
    }

    /// Every open call so far, with its options.
    pub fn opened(&self) -> Vec<(String, FileOpenOptions)> {
        self.lock().opened.clone()
    }

    /// Files opened and not yet closed.
    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    /// Make every subsequent open fail with `kind`, even for existing files.
    pub fn fail_opens(&self, kind: io::ErrorKind) {
        self.lock().open_fault = Some(kind);
    }

    /// Make every subsequent read fail with `kind`.
    pub fn fail_reads(&self, kind: io::ErrorKind) {
        self.lock().read_fault = Some(kind);
    }
}

#[async_trait]
impl FileTransfer for MemoryFiles {
    type File = MemoryFile;

    async fn open(&self, path: &str, options: FileOpenOptions) -> io::Result<MemoryFile> {
        let mut state = self.lock();
        state.opened.push((path.to_owned(), options));
        if let Some(kind) = state.open_fault {
            return Err(kind.into());
        }

        let key = normalize(path);
        let data = state
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}")))?;
        state.open_count += 1;
        Ok(MemoryFile { path: key, data, position: 0, delete_on_close: options.delete_on_close })
    }

    async fn read(&self, file: &mut MemoryFile, length: u32) -> io::Result<Bytes> {
        if let Some(kind) = self.lock().read_fault {
            return Err(kind.into());
        }
        let end = file.data.len().min(file.position.saturating_add(length as usize));
        let chunk = file.data.slice(file.position..end);
        file.position = end;
        Ok(chunk)
    }

    async fn close(&self, file: MemoryFile) -> io::Result<()> {
        let mut state = self.lock();
        state.open_count = state.open_count.saturating_sub(1);
        if file.delete_on_close {
            state.files.remove(&file.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_in_chunks_until_empty() {
        let files = MemoryFiles::new();
        files.insert(r"Windows\Temp\hive", &b"regfhive"[..]);

        let mut file = files.open(r"windows\temp\HIVE", FileOpenOptions::default()).await.unwrap();
        assert_eq!(files.read(&mut file, 5).await.unwrap().as_ref(), b"regfh");
        assert_eq!(files.read(&mut file, 5).await.unwrap().as_ref(), b"ive");
        assert!(files.read(&mut file, 5).await.unwrap().is_empty());
        files.close(file).await.unwrap();

        assert!(files.contains(r"Windows\Temp\hive"));
        assert_eq!(files.open_count(), 0);
    }

    #[tokio::test]
    async fn delete_on_close_removes_the_file() {
        let files = MemoryFiles::new();
        files.insert("dump", Bytes::from_static(b"x"));

        let file = files.open("dump", FileOpenOptions { delete_on_close: true }).await.unwrap();
        files.close(file).await.unwrap();

        assert!(!files.contains("dump"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = MemoryFiles::new().open("nope", FileOpenOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn open_fault_applies_to_existing_files() {
        let files = MemoryFiles::new();
        files.insert("dump", Bytes::from_static(b"x"));
        files.fail_opens(io::ErrorKind::PermissionDenied);

        let err = files.open("dump", FileOpenOptions::default()).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(files.open_count(), 0);
        assert!(files.contains("dump"));
    }
}
