//! Pool document on the local filesystem.
//!
//! With locking enabled every mutation holds an exclusive advisory lock on
//! `<pool_file>.lock` and re-reads the document under it, so processes on the
//! same host never hand out the same member twice. Without it, concurrent
//! writers can lose each other's updates.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{FileStoreOptions, StoreKind};

use super::document::{DocumentBackend, DocumentLock, DocumentStore};
use super::{PoolStore, StoreError};

/// Pool store backed by a local YAML file.
pub type FileStore = DocumentStore<FileDocument>;

/// A YAML pool document on disk.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    lock: bool,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>, lock: bool) -> Self {
        Self {
            path: path.into(),
            lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sidecar(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl DocumentBackend for FileDocument {
    fn kind(&self) -> StoreKind {
        StoreKind::File
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&mut self) -> Result<String, StoreError> {
        tracing::debug!("Reading pool document {}", self.path.display());
        fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn save(&mut self, content: &str) -> Result<(), StoreError> {
        let tmp = self.sidecar(".tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn lock(&self) -> Result<Option<DocumentLock>, StoreError> {
        if !self.lock {
            return Ok(None);
        }
        DocumentLock::exclusive(&self.sidecar(".lock")).map(Some)
    }
}

impl DocumentStore<FileDocument> {
    /// Open the pool file and load it.
    ///
    /// # Errors
    /// A missing, unreadable or malformed pool file is fatal here rather than
    /// on the first lease.
    pub fn open(options: &FileStoreOptions) -> Result<Self, StoreError> {
        let mut store = DocumentStore::new(FileDocument::new(&options.pool_file, options.lock));
        let pools = store.current_state(false)?;
        tracing::debug!(
            "Opened {} with {} pool(s)",
            options.pool_file.display(),
            pools.len()
        );
        Ok(store)
    }
}
