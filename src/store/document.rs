//! Pool state kept in a single document.
//!
//! [`DocumentStore`] owns the lease semantics; a [`DocumentBackend`] only
//! knows how to fetch and replace the raw document. The file store and both
//! blob stores are `DocumentStore`s over different backends.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::config::StoreKind;
use crate::pool::{document, Pool, PoolCollection, PoolMember};

use super::{PoolStore, ReleaseStatus, StoreError};

/// Raw storage of a pool document.
pub trait DocumentBackend {
    fn kind(&self) -> StoreKind;

    /// Human readable location, used in errors and logs.
    fn location(&self) -> String;

    /// Fetch the whole document.
    ///
    /// Backends whose document may legitimately not exist yet create an empty
    /// one here instead of failing.
    fn load(&mut self) -> Result<String, StoreError>;

    /// Replace the whole document.
    fn save(&mut self, content: &str) -> Result<(), StoreError>;

    /// Exclusive lock held for the duration of one mutation.
    ///
    /// When a lock is returned the store re-reads the document under it
    /// before mutating. The default is no locking.
    fn lock(&self) -> Result<Option<DocumentLock>, StoreError> {
        Ok(None)
    }
}

/// Advisory lock on a file, released on drop.
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
    path: PathBuf,
}

impl DocumentLock {
    /// Block until an exclusive lock on `path` is held, creating the file if needed.
    pub fn exclusive(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        file.lock_exclusive().map_err(|e| StoreError::io(path, e))?;
        tracing::trace!("Locked {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

/// Pool store over a whole-document backend.
///
/// The collection is loaded on first access and cached. Each mutation
/// rewrites the full document before returning.
pub struct DocumentStore<B> {
    backend: B,
    cache: Option<PoolCollection>,
}

impl<B: DocumentBackend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn fetch(&mut self) -> Result<PoolCollection, StoreError> {
        let content = self.backend.load()?;
        document::decode(&content).map_err(|source| StoreError::MalformedDocument {
            location: self.backend.location(),
            source,
        })
    }

    fn collection(&mut self) -> Result<&mut PoolCollection, StoreError> {
        let collection = match self.cache.take() {
            Some(cached) => cached,
            None => self.fetch()?,
        };
        Ok(self.cache.insert(collection))
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let content = match &self.cache {
            Some(collection) => document::encode(collection)?,
            None => return Ok(()),
        };
        self.backend.save(&content)?;
        tracing::debug!("Saved pool document to {}", self.backend.location());
        Ok(())
    }

    /// Apply `op` to one pool and persist the result if the pool changed.
    fn mutate<T>(
        &mut self,
        pool: &str,
        op: impl FnOnce(&mut Pool) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let lock = self.backend.lock()?;
        if lock.is_some() {
            self.cache = None;
        }

        let (out, changed) = {
            let collection = self.collection()?;
            let entry = collection
                .get_mut(pool)
                .ok_or_else(|| StoreError::PoolNotFound {
                    pool: pool.to_string(),
                })?;
            let before = entry.clone();
            let out = op(entry)?;
            (out, *entry != before)
        };

        if changed {
            if let Err(e) = self.persist() {
                // The cache now disagrees with the backing document.
                self.cache = None;
                return Err(e);
            }
        }

        drop(lock);
        Ok(out)
    }
}

impl<B: DocumentBackend> PoolStore for DocumentStore<B> {
    fn kind(&self) -> StoreKind {
        self.backend.kind()
    }

    fn acquire(&mut self, pool: &str) -> Result<PoolMember, StoreError> {
        let member = self.mutate(pool, |entry| {
            entry
                .lease_random(&mut rand::thread_rng())
                .ok_or_else(|| StoreError::EmptyPool {
                    pool: pool.to_string(),
                })
        })?;
        tracing::info!("Leased {} from pool {}", member, pool);
        Ok(member)
    }

    fn release(
        &mut self,
        member: &str,
        pool: &str,
        reuse: bool,
    ) -> Result<ReleaseStatus, StoreError> {
        let status = self.mutate(pool, |entry| {
            let status = if reuse {
                if entry.give_back(member) {
                    ReleaseStatus::Returned
                } else {
                    ReleaseStatus::Unchanged
                }
            } else if entry.retire(member) {
                ReleaseStatus::Retired
            } else {
                ReleaseStatus::Unchanged
            };
            Ok(status)
        })?;
        tracing::info!("Released {} from pool {}: {}", member, pool, status);
        Ok(status)
    }

    fn current_state(&mut self, refresh: bool) -> Result<PoolCollection, StoreError> {
        if refresh {
            self.cache = None;
        }
        self.collection().map(|c| c.clone())
    }
}
