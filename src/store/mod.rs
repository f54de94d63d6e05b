//! Pool store contract and its backends.
//!
//! Every backend implements [`PoolStore`], so callers pick one by
//! configuration and stay backend-agnostic.
//!
//! The file and blob stores rewrite their whole document on every mutation.
//! Two processes sharing a remote blob can both read the same `available`
//! list before either writes, so the same hostname may be handed out twice.
//! The file store narrows this with an advisory lock (see [`file`]); the
//! leasing service arbitrates leases itself.

pub mod blob;
pub mod document;
pub mod error;
pub mod file;
pub mod leasing;

use std::fmt;

use crate::config::StoreKind;
use crate::pool::{PoolCollection, PoolMember};

pub use blob::{CommitStore, SnippetStore};
pub use document::{DocumentBackend, DocumentLock, DocumentStore};
pub use error::StoreError;
pub use file::FileStore;
pub use leasing::LeasingServiceStore;

/// Outcome of [`PoolStore::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// Moved back to the available list.
    Returned,
    /// Retired into the garbage list.
    Retired,
    /// Destroyed by the leasing service.
    Destroyed,
    /// Nothing to do: not leased, or already retired.
    Unchanged,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Returned => "returned",
            Self::Retired => "retired",
            Self::Destroyed => "destroyed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lease and return pool members.
///
/// All calls block until the backing medium has been updated.
pub trait PoolStore {
    /// Which backend this is.
    fn kind(&self) -> StoreKind;

    /// Lease one member of `pool`.
    ///
    /// # Errors
    /// `PoolNotFound` for an unknown pool, `EmptyPool` or
    /// `PoolMemberUnavailable` when nothing can be granted.
    fn acquire(&mut self, pool: &str) -> Result<PoolMember, StoreError>;

    /// Give a leased member back.
    ///
    /// With `reuse` the member returns to the available list; otherwise it
    /// is retired (or destroyed, for the leasing service). Repeating a
    /// release never duplicates entries.
    fn release(
        &mut self,
        member: &str,
        pool: &str,
        reuse: bool,
    ) -> Result<ReleaseStatus, StoreError>;

    /// Current pools, reloaded from the backing medium when `refresh` is set.
    fn current_state(&mut self, refresh: bool) -> Result<PoolCollection, StoreError>;
}

impl<S: PoolStore + ?Sized> PoolStore for Box<S> {
    fn kind(&self) -> StoreKind {
        (**self).kind()
    }

    fn acquire(&mut self, pool: &str) -> Result<PoolMember, StoreError> {
        (**self).acquire(pool)
    }

    fn release(
        &mut self,
        member: &str,
        pool: &str,
        reuse: bool,
    ) -> Result<ReleaseStatus, StoreError> {
        (**self).release(member, pool, reuse)
    }

    fn current_state(&mut self, refresh: bool) -> Result<PoolCollection, StoreError> {
        (**self).current_state(refresh)
    }
}
