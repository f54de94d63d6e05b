//! Lease disposable VM hostnames from named pools.
//!
//! Pools live in one of four stores: a local YAML file, a GitLab snippet, a
//! file committed to a GitLab repository, or a remote leasing service. Pick
//! one with [`config::DriverConfig`] and [`registry::open_store`], then use
//! the [`store::PoolStore`] contract.

pub mod config;
pub mod pool;
pub mod registry;
pub mod remote;
pub mod store;

pub use config::{DriverConfig, StoreKind};
pub use pool::{Pool, PoolCollection, PoolMember};
pub use registry::open_store;
pub use store::{PoolStore, ReleaseStatus, StoreError};
